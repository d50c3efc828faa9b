use workpass_core::error::AppError;

pub mod ollama_llm;
pub mod openai_llm;

pub use ollama_llm::OllamaLlm;
pub use openai_llm::OpenAiLlm;

/// Single-turn generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
}

/// Stateless text generation provider.
pub trait Llm {
    fn generate(&self, req: &GenerateRequest<'_>) -> Result<String, AppError>;
}
