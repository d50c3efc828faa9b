use serde::{Deserialize, Serialize};
use workpass_core::error::{codes, AppError};

use super::{GenerateRequest, Llm};
use crate::http::map_ureq_error;
use crate::openai::OpenAiClient;

#[derive(Debug, Clone)]
pub struct OpenAiLlm {
    client: OpenAiClient,
}

impl OpenAiLlm {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl Llm for OpenAiLlm {
    fn generate(&self, req: &GenerateRequest<'_>) -> Result<String, AppError> {
        let body = ChatRequest {
            model: req.model,
            temperature: req.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: req.prompt,
            }],
        };

        let resp = self
            .client
            .post("chat/completions")
            .send_json(body)
            .map_err(|e| map_ureq_error(e, codes::AI_GENERATION_FAILED, "Chat completion request"))?;

        let parsed: ChatResponse = resp.into_json().map_err(|e| {
            AppError::new(codes::AI_GENERATION_FAILED, "Failed to decode chat completion")
                .with_details(e.to_string())
        })?;
        let answer = parsed
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .unwrap_or_default();
        if answer.trim().is_empty() {
            return Err(AppError::new(
                codes::AI_GENERATION_FAILED,
                "Chat completion returned no content",
            ));
        }
        Ok(answer)
    }
}
