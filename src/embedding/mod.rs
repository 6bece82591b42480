//! Embedding providers.

mod huggingface;
mod openai_compat;
mod provider;

use std::sync::Arc;
use std::time::Duration;

pub use huggingface::HuggingFaceEmbeddings;
pub use openai_compat::OpenAiCompatEmbeddings;
pub use provider::EmbeddingProvider;

use crate::core::config::settings::{EmbeddingBackend, EmbeddingSection};
use crate::core::errors::ApiError;

pub fn from_config(config: &EmbeddingSection) -> Result<Arc<dyn EmbeddingProvider>, ApiError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingBackend::HuggingFace => Arc::new(HuggingFaceEmbeddings::new(
            config.base_url.clone(),
            config.model.clone(),
            config.api_key.clone(),
            timeout,
        )?),
        EmbeddingBackend::OpenAi => Arc::new(OpenAiCompatEmbeddings::new(
            config.base_url.clone(),
            config.model.clone(),
            config.api_key.clone(),
            timeout,
        )?),
    };
    Ok(provider)
}
