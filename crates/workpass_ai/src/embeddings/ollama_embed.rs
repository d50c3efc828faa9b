use serde::{Deserialize, Serialize};
use workpass_core::error::{codes, AppError};

use super::Embedder;
use crate::http::map_ureq_error;
use crate::ollama::OllamaClient;

/// Inputs above this many bytes are cut before sending.
const MAX_INPUT_BYTES: usize = 12_000;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

fn truncate_on_char_boundary(input: &str, max_bytes: usize) -> &str {
    if input.len() <= max_bytes {
        return input;
    }
    let mut end = max_bytes;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let prompt = truncate_on_char_boundary(input, MAX_INPUT_BYTES);
        let url = format!("{}/api/embeddings", self.client.base_url());

        let resp = ureq::post(&url)
            .timeout(self.client.timeout())
            .send_json(EmbeddingsRequest { model, prompt })
            .map_err(|e| map_ureq_error(e, codes::AI_EMBEDDINGS_FAILED, "Embeddings request"))?;

        let v: EmbeddingsResponse = resp.into_json().map_err(|e| {
            AppError::new(codes::AI_EMBEDDINGS_FAILED, "Failed to decode embeddings response")
                .with_details(e.to_string())
        })?;
        if v.embedding.is_empty() {
            return Err(AppError::new(
                codes::AI_EMBEDDINGS_FAILED,
                "Embeddings response was empty",
            ));
        }
        Ok(v.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_on_char_boundary;

    #[test]
    fn truncation_never_splits_a_char() {
        let s = "é".repeat(10);
        assert_eq!(truncate_on_char_boundary(&s, 5), "éé");
        assert_eq!(truncate_on_char_boundary("abc", 10), "abc");
    }
}
