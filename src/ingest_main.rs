//! Full (re-)ingestion of the review dataset into the vector index.

use std::sync::Arc;

use anyhow::Context;

use product_review_assistant::core::config::{AppPaths, ConfigService};
use product_review_assistant::core::logging;
use product_review_assistant::rag::Ingestor;
use product_review_assistant::state::{document_source, open_index};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let paths = Arc::new(AppPaths::new());
    paths
        .ensure_dirs()
        .with_context(|| format!("Failed to create {}", paths.user_data_dir.display()))?;
    logging::init(&paths.log_dir, "ingest")?;

    let settings = ConfigService::new(paths.clone())
        .load_settings()
        .context("Failed to load configuration")?;

    let index = open_index(&paths, &settings).await?;
    let source = document_source(&paths, &settings);
    let index = Ingestor::new(index, source, &settings.ingest)
        .ingest(false)
        .await
        .context("Ingestion failed")?;

    let documents = index.count().await?;
    tracing::info!(
        collection = %index.collection(),
        documents,
        "vector index ready"
    );
    Ok(())
}
