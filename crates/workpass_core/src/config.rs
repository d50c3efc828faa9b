use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{codes, AppError};

pub const DEFAULT_CONFIG_FILE: &str = "workpass.toml";
pub const CONFIG_PATH_ENV: &str = "WORKPASS_CONFIG";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Static parameters for every stage of the assistant. Built once and handed
/// to each component; nothing reads process-wide state after load.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub store: StoreConfig,
    pub provider: ProviderConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks injected into the answer prompt.
    pub answer_k: u32,
    /// Default result count for exploratory search.
    pub search_k: u32,
    pub search_k_min: u32,
    pub search_k_max: u32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            answer_k: 5,
            search_k: 10,
            search_k_min: 5,
            search_k_max: 20,
        }
    }
}

impl RetrievalConfig {
    pub fn clamp_search_k(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.search_k)
            .clamp(self.search_k_min, self.search_k_max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub collection_name: String,
    pub storage_path: PathBuf,
    /// Processed `[{text, metadata}]` artifact, also the recovery source.
    pub processed_path: PathBuf,
    /// Raw scraper dump.
    pub pages_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection_name: "singapore_work_passes".to_string(),
            storage_path: PathBuf::from("./vector_db"),
            processed_path: PathBuf::from("processed_knowledge_base.json"),
            pages_path: PathBuf::from("mom_data.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    pub embedding_model: String,
    pub llm_model: String,
    pub temperature: f32,
    pub embed_batch_size: usize,
    pub timeout_secs: u64,
    /// Never read from the file; filled from `OPENAI_API_KEY`.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            embed_batch_size: 256,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl AppConfig {
    /// Parses a TOML document; missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        let cfg: AppConfig = toml::from_str(raw).map_err(|e| {
            AppError::new(codes::CONFIG_INVALID, "Failed to parse configuration")
                .with_details(e.to_string())
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::new(codes::CONFIG_READ_FAILED, "Failed to read configuration file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Resolution order: explicit path, `WORKPASS_CONFIG`, `./workpass.toml`
    /// when present, defaults. The API key always comes from the environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut cfg = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::from_file(&local)?
                } else {
                    let cfg = Self::default();
                    cfg.validate()?;
                    cfg
                }
            }
        };
        cfg.provider.api_key = std::env::var(OPENAI_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            return Err(invalid("chunking.chunk_size must be greater than zero"));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(invalid("chunking.chunk_overlap must be smaller than chunk_size")
                .with_details(format!(
                    "chunk_size={}; chunk_overlap={}",
                    c.chunk_size, c.chunk_overlap
                )));
        }
        let r = &self.retrieval;
        if r.answer_k == 0 {
            return Err(invalid("retrieval.answer_k must be at least 1"));
        }
        if r.search_k_min == 0 || r.search_k_min > r.search_k_max {
            return Err(invalid("retrieval search bounds are inconsistent").with_details(
                format!("search_k_min={}; search_k_max={}", r.search_k_min, r.search_k_max),
            ));
        }
        if self.store.collection_name.trim().is_empty() {
            return Err(invalid("store.collection_name must not be empty"));
        }
        let p = &self.provider;
        if !(0.0..=2.0).contains(&p.temperature) {
            return Err(invalid("provider.temperature must be within 0.0..=2.0"));
        }
        if p.embed_batch_size == 0 {
            return Err(invalid("provider.embed_batch_size must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts must be at least 1"));
        }
        if self.retry.multiplier < 1.0 {
            return Err(invalid("retry.multiplier must be >= 1.0"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::new(codes::CONFIG_INVALID, message)
}
