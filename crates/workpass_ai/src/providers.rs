use workpass_core::config::{ProviderConfig, ProviderKind};
use workpass_core::error::{codes, AppError};

use crate::embeddings::{Embedder, OllamaEmbedder, OpenAiEmbedder};
use crate::llm::{Llm, OllamaLlm, OpenAiLlm};
use crate::ollama::OllamaClient;
use crate::openai::OpenAiClient;

fn openai_client(cfg: &ProviderConfig) -> Result<OpenAiClient, AppError> {
    let key = cfg.api_key.as_deref().ok_or_else(|| {
        AppError::new(
            codes::CONFIG_INVALID,
            "Missing OpenAI API key; set OPENAI_API_KEY",
        )
    })?;
    OpenAiClient::new(&cfg.base_url, key, cfg.timeout())
}

fn ollama_client(cfg: &ProviderConfig) -> Result<OllamaClient, AppError> {
    Ok(OllamaClient::new(&cfg.base_url)?.with_timeout(cfg.timeout()))
}

pub fn embedder_from_config(cfg: &ProviderConfig) -> Result<Box<dyn Embedder>, AppError> {
    Ok(match cfg.kind {
        ProviderKind::OpenAi => Box::new(OpenAiEmbedder::new(openai_client(cfg)?)),
        ProviderKind::Ollama => Box::new(OllamaEmbedder::new(ollama_client(cfg)?)),
    })
}

pub fn llm_from_config(cfg: &ProviderConfig) -> Result<Box<dyn Llm>, AppError> {
    Ok(match cfg.kind {
        ProviderKind::OpenAi => Box::new(OpenAiLlm::new(openai_client(cfg)?)),
        ProviderKind::Ollama => Box::new(OllamaLlm::new(ollama_client(cfg)?)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_requires_a_key() {
        let cfg = ProviderConfig::default();
        let err = embedder_from_config(&cfg).err().expect("no key");
        assert_eq!(err.code, codes::CONFIG_INVALID);

        let cfg = ProviderConfig {
            api_key: Some("sk-test".to_string()),
            ..ProviderConfig::default()
        };
        assert!(embedder_from_config(&cfg).is_ok());
        assert!(llm_from_config(&cfg).is_ok());
    }

    #[test]
    fn ollama_stays_on_localhost() {
        let cfg = ProviderConfig {
            kind: ProviderKind::Ollama,
            base_url: "http://127.0.0.1:11434".to_string(),
            ..ProviderConfig::default()
        };
        assert!(llm_from_config(&cfg).is_ok());

        let cfg = ProviderConfig {
            kind: ProviderKind::Ollama,
            base_url: "https://api.openai.com/v1".to_string(),
            ..ProviderConfig::default()
        };
        assert!(llm_from_config(&cfg).is_err());
    }
}
