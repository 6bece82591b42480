//! Abstract interface over the document index.
//!
//! An index owns its embedding provider: callers hand it documents and
//! query text, never raw vectors.

use async_trait::async_trait;

use super::document::{Document, SearchHit};
use crate::core::errors::ApiError;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name of the logical collection this handle reads and writes.
    fn collection(&self) -> &str;

    /// Embed and store documents, replacing any with the same id.
    /// Returns the number of documents written.
    async fn upsert(&self, documents: &[Document]) -> Result<usize, ApiError>;

    /// Top-`k` documents for `query`, best first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, ApiError>;

    /// Number of documents in the collection.
    async fn count(&self) -> Result<usize, ApiError>;

    /// Remove every document in the collection.
    async fn clear(&self) -> Result<(), ApiError>;
}
