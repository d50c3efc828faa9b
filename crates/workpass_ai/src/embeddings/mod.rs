use workpass_core::error::AppError;

pub mod ollama_embed;
pub mod openai_embed;

pub use ollama_embed::OllamaEmbedder;
pub use openai_embed::OpenAiEmbedder;

/// Text embedding provider.
///
/// Document and query embeddings may differ for some providers, hence the
/// separate `embed_query`. `embed_batch` defaults to one call per input;
/// providers with a batch endpoint override it.
pub trait Embedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError>;

    fn embed_query(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        self.embed(model, input)
    }

    fn embed_batch(&self, model: &str, inputs: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        inputs.iter().map(|input| self.embed(model, input)).collect()
    }
}
