use serde::{Deserialize, Serialize};
use workpass_core::error::{codes, AppError};

use super::Embedder;
use crate::http::map_ureq_error;
use crate::openai::OpenAiClient;

/// The embeddings endpoint accepts at most this many inputs per request.
pub const OPENAI_MAX_BATCH_INPUTS: usize = 2048;

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: OpenAiClient,
}

impl OpenAiEmbedder {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let mut out = self.embed_batch(model, &[input])?;
        out.pop().ok_or_else(|| {
            AppError::new(codes::AI_EMBEDDINGS_FAILED, "Embeddings response was empty")
        })
    }

    fn embed_batch(&self, model: &str, inputs: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        if inputs.len() > OPENAI_MAX_BATCH_INPUTS {
            return Err(AppError::new(
                codes::AI_EMBEDDINGS_FAILED,
                "Embedding batch exceeds the provider limit",
            )
            .with_details(format!(
                "inputs={}; max={OPENAI_MAX_BATCH_INPUTS}",
                inputs.len()
            )));
        }

        let resp = self
            .client
            .post("embeddings")
            .send_json(EmbeddingRequest { model, input: inputs })
            .map_err(|e| map_ureq_error(e, codes::AI_EMBEDDINGS_FAILED, "Embeddings request"))?;

        let mut parsed: EmbeddingResponse = resp.into_json().map_err(|e| {
            AppError::new(codes::AI_EMBEDDINGS_FAILED, "Failed to decode embeddings response")
                .with_details(e.to_string())
        })?;
        if parsed.data.len() != inputs.len() {
            return Err(AppError::new(
                codes::AI_EMBEDDINGS_FAILED,
                "Embeddings response size does not match the request",
            )
            .with_details(format!(
                "inputs={}; embeddings={}",
                inputs.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
