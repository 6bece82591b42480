use std::sync::Arc;

use super::source::DocumentSource;
use super::store::VectorIndex;
use crate::core::config::settings::IngestSection;
use crate::core::errors::PipelineError;

/// Populates a vector index from a document source.
pub struct Ingestor {
    index: Arc<dyn VectorIndex>,
    source: Arc<dyn DocumentSource>,
    batch_size: usize,
    replace_collection: bool,
}

impl Ingestor {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        source: Arc<dyn DocumentSource>,
        config: &IngestSection,
    ) -> Self {
        Self {
            index,
            source,
            batch_size: config.batch_size.max(1),
            replace_collection: config.replace_collection,
        }
    }

    /// With `load_existing` the index handle is returned untouched. Otherwise
    /// every source document is embedded and upserted batch by batch; batches
    /// committed before a failure stay committed.
    pub async fn ingest(&self, load_existing: bool) -> Result<Arc<dyn VectorIndex>, PipelineError> {
        if load_existing {
            tracing::debug!(
                collection = %self.index.collection(),
                "using existing vector index"
            );
            return Ok(self.index.clone());
        }

        let documents = self.source.load().await?;
        tracing::info!(
            source = %self.source.describe(),
            collection = %self.index.collection(),
            documents = documents.len(),
            "starting full ingest"
        );

        if self.replace_collection {
            self.index.clear().await.map_err(PipelineError::ingestion)?;
            tracing::info!(collection = %self.index.collection(), "cleared collection");
        }

        let mut written = 0usize;
        for (batch_no, batch) in documents.chunks(self.batch_size).enumerate() {
            match self.index.upsert(batch).await {
                Ok(count) => {
                    written += count;
                    tracing::debug!(batch = batch_no, written, "batch upserted");
                }
                Err(err) => {
                    tracing::error!(
                        batch = batch_no,
                        written,
                        error = %err,
                        "ingest aborted; index is partially written"
                    );
                    return Err(PipelineError::ingestion(err));
                }
            }
        }

        tracing::info!(collection = %self.index.collection(), written, "ingest finished");
        Ok(self.index.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::sqlite::SqliteVectorIndex;
    use crate::test_support::{review_doc, KeywordEmbeddings, StaticSource};

    fn config(batch_size: usize, replace_collection: bool) -> IngestSection {
        IngestSection {
            batch_size,
            replace_collection,
            ..IngestSection::default()
        }
    }

    async fn sqlite_index(embedder: Arc<KeywordEmbeddings>) -> Arc<SqliteVectorIndex> {
        let tmp = std::env::temp_dir().join(format!("pra-ingest-test-{}.db", uuid::Uuid::new_v4()));
        Arc::new(
            SqliteVectorIndex::with_path(tmp, "flipkartdb", embedder)
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn load_existing_never_reads_or_embeds() {
        let embedder = Arc::new(KeywordEmbeddings::new(&["gaming"]));
        let index = sqlite_index(embedder.clone()).await;
        let source = Arc::new(StaticSource::new(vec![review_doc("A", "gaming")]));
        let ingestor = Ingestor::new(index.clone(), source.clone(), &config(8, false));

        ingestor.ingest(true).await.unwrap();
        ingestor.ingest(true).await.unwrap();

        assert_eq!(source.loads(), 0);
        assert_eq!(embedder.calls(), 0);
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn full_ingest_embeds_in_batches() {
        let embedder = Arc::new(KeywordEmbeddings::new(&["gaming", "battery"]));
        let index = sqlite_index(embedder.clone()).await;
        let docs: Vec<_> = (0..5)
            .map(|i| review_doc(&format!("Laptop {}", i), "gaming battery"))
            .collect();
        let source = Arc::new(StaticSource::new(docs));
        let ingestor = Ingestor::new(index.clone(), source, &config(2, false));

        let handle = ingestor.ingest(false).await.unwrap();

        assert_eq!(handle.count().await.unwrap(), 5);
        assert_eq!(embedder.batch_sizes(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn repeated_full_ingest_keeps_one_copy_per_document() {
        let embedder = Arc::new(KeywordEmbeddings::new(&["gaming"]));
        let index = sqlite_index(embedder).await;
        let source = Arc::new(StaticSource::new(vec![
            review_doc("A", "gaming"),
            review_doc("B", "more gaming"),
        ]));
        let ingestor = Ingestor::new(index.clone(), source, &config(16, false));

        ingestor.ingest(false).await.unwrap();
        ingestor.ingest(false).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn replace_collection_drops_documents_removed_from_source() {
        let embedder = Arc::new(KeywordEmbeddings::new(&["gaming"]));
        let index = sqlite_index(embedder).await;

        let first = Arc::new(StaticSource::new(vec![
            review_doc("A", "gaming"),
            review_doc("B", "gaming too"),
        ]));
        Ingestor::new(index.clone(), first, &config(16, false))
            .ingest(false)
            .await
            .unwrap();

        let second = Arc::new(StaticSource::new(vec![review_doc("A", "gaming")]));
        Ingestor::new(index.clone(), second, &config(16, true))
            .ingest(false)
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn embedding_outage_is_an_ingestion_failure() {
        let embedder = Arc::new(KeywordEmbeddings::new(&["gaming"]));
        embedder.set_failing(true);
        let index = sqlite_index(embedder).await;
        let source = Arc::new(StaticSource::new(vec![review_doc("A", "gaming")]));

        let result = Ingestor::new(index, source, &config(4, false))
            .ingest(false)
            .await;

        assert!(matches!(result, Err(PipelineError::Ingestion(_))));
    }
}
