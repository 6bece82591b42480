//! Review index: documents, the vector index seam and its SQLite backend,
//! dataset readers, and the ingestion coordinator.

mod document;
mod ingest;
mod source;
mod sqlite;
mod store;

pub use document::{Document, SearchHit, TITLE_KEY};
pub use ingest::Ingestor;
pub use source::{source_for_path, CsvDocumentSource, DocumentSource, JsonlDocumentSource};
pub use sqlite::SqliteVectorIndex;
pub use store::VectorIndex;
