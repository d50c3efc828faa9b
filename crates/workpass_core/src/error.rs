use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes shared by the build pipeline, the engine and the providers.
pub mod codes {
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const CONFIG_READ_FAILED: &str = "CONFIG_READ_FAILED";

    pub const PAGES_READ_FAILED: &str = "PAGES_READ_FAILED";
    pub const PAGES_EMPTY: &str = "PAGES_EMPTY";
    pub const ARTIFACT_READ_FAILED: &str = "ARTIFACT_READ_FAILED";
    pub const ARTIFACT_WRITE_FAILED: &str = "ARTIFACT_WRITE_FAILED";
    pub const METADATA_ENCODE_FAILED: &str = "METADATA_ENCODE_FAILED";

    pub const STORE_OPEN_FAILED: &str = "STORE_OPEN_FAILED";
    pub const STORE_QUERY_FAILED: &str = "STORE_QUERY_FAILED";
    pub const STORE_WRITE_FAILED: &str = "STORE_WRITE_FAILED";

    pub const AI_REMOTE_NOT_ALLOWED: &str = "AI_REMOTE_NOT_ALLOWED";
    pub const AI_PROVIDER_UNREACHABLE: &str = "AI_PROVIDER_UNREACHABLE";
    pub const AI_RATE_LIMITED: &str = "AI_RATE_LIMITED";
    pub const AI_RATE_LIMIT_EXHAUSTED: &str = "AI_RATE_LIMIT_EXHAUSTED";
    pub const AI_EMBEDDINGS_FAILED: &str = "AI_EMBEDDINGS_FAILED";
    pub const AI_GENERATION_FAILED: &str = "AI_GENERATION_FAILED";
    pub const AI_INDEX_BUILD_FAILED: &str = "AI_INDEX_BUILD_FAILED";
    pub const AI_INDEX_NOT_READY: &str = "AI_INDEX_NOT_READY";
    pub const AI_RETRIEVAL_FAILED: &str = "AI_RETRIEVAL_FAILED";
}

/// Single structured error shape used by every crate in the workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.details.as_deref() {
            Some(details) => write!(f, "[{}] {} ({})", self.code, self.message, details),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for AppError {}
