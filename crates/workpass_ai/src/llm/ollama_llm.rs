use serde::{Deserialize, Serialize};
use workpass_core::error::{codes, AppError};

use super::{GenerateRequest, Llm};
use crate::http::map_ureq_error;
use crate::ollama::OllamaClient;

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Llm for OllamaLlm {
    fn generate(&self, req: &GenerateRequest<'_>) -> Result<String, AppError> {
        let url = format!("{}/api/generate", self.client.base_url());
        let body = OllamaGenerateRequest {
            model: req.model,
            prompt: req.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: req.temperature,
            },
        };

        let resp = ureq::post(&url)
            .timeout(self.client.timeout())
            .send_json(body)
            .map_err(|e| map_ureq_error(e, codes::AI_GENERATION_FAILED, "Generate request"))?;

        let v: GenerateResponse = resp.into_json().map_err(|e| {
            AppError::new(codes::AI_GENERATION_FAILED, "Failed to decode generate response")
                .with_details(e.to_string())
        })?;
        if v.response.trim().is_empty() {
            return Err(AppError::new(
                codes::AI_GENERATION_FAILED,
                "Generate response was empty",
            ));
        }
        Ok(v.response)
    }
}
