use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to initialize embedding provider: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[source] anyhow::Error),

    #[error("Failed to open vector index: {0}")]
    VectorIndex(#[source] anyhow::Error),

    #[error("Failed to ingest documents: {0}")]
    Ingest(#[source] anyhow::Error),
}
