use std::time::Duration;

use workpass_core::error::{codes, AppError};

/// Connection settings for an OpenAI-compatible HTTP API.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::new(
                codes::CONFIG_INVALID,
                "Missing OpenAI API key; set OPENAI_API_KEY",
            ));
        }
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(AppError::new(
                codes::CONFIG_INVALID,
                "OpenAI base URL must be an http(s) URL",
            )
            .with_details(format!("base_url={base_url}")));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn post(&self, path: &str) -> ureq::Request {
        ureq::post(&self.endpoint(path))
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
    }
}
