//! Typed view of the merged configuration.
//!
//! Every field has a default so an absent `config.yml` yields a runnable
//! service pointed at the hosted Groq and Hugging Face endpoints.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub server: ServerSection,
    pub llm: LlmSection,
    pub embedding: EmbeddingSection,
    pub vector_store: VectorStoreSection,
    pub retrieval: RetrievalSection,
    pub sessions: SessionSection,
    pub ingest: IngestSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub max_input_length: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            max_input_length: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Session used when a `/get` request does not name one.
    pub default_session_id: String,
    /// Extra origins allowed by CORS. Empty means localhost on `port` only.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            default_session_id: "user-session".to_string(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// Base URL of an OpenAI-compatible API (without the `/v1` suffix).
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.5,
            max_tokens: None,
            api_key: None,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    HuggingFace,
    OpenAi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub provider: EmbeddingBackend,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::HuggingFace,
            base_url: "https://router.huggingface.co/hf-inference".to_string(),
            model: "BAAI/bge-base-en-v1.5".to_string(),
            api_key: None,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSection {
    /// SQLite file; defaults to `<data_dir>/reviews.db`.
    pub path: Option<PathBuf>,
    pub collection: String,
}

impl Default for VectorStoreSection {
    fn default() -> Self {
        Self {
            path: None,
            collection: "flipkartdb".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub top_k: usize,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub max_sessions: usize,
    /// Idle lifetime of a session; 0 disables expiry.
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            ttl_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    pub source_path: PathBuf,
    pub batch_size: usize,
    /// Clear the collection before a full ingest.
    pub replace_collection: bool,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("data/flipkart_product_review.csv"),
            batch_size: 32,
            replace_collection: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: AppConfig = serde_json::from_value(json!({
            "llm": { "model": "mixtral-8x7b" },
            "embedding": { "provider": "open_ai" },
            "retrieval": {}
        }))
        .unwrap();

        assert_eq!(config.llm.model, "mixtral-8x7b");
        assert_eq!(config.llm.temperature, 0.5);
        assert_eq!(config.embedding.provider, EmbeddingBackend::OpenAi);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.server.default_session_id, "user-session");
        assert_eq!(config.vector_store.collection, "flipkartdb");
    }
}
