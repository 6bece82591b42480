use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::chain::{ChainSettings, ConversationalRetrievalChain};
use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::core::errors::PipelineError;
use crate::embedding;
use crate::history::{InMemorySessionStore, SessionStore};
use crate::llm::{LlmProvider, OpenAiCompatProvider};
use crate::metrics::Metrics;
use crate::rag::{source_for_path, DocumentSource, Ingestor, SqliteVectorIndex, VectorIndex};

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes and background tasks.
///
/// Holds the loaded configuration, the three providers behind their trait
/// seams, the session store and the retrieval chain built from them.
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Arc<AppConfig>,
    pub llm: Arc<dyn LlmProvider>,
    pub index: Arc<dyn VectorIndex>,
    pub sessions: Arc<dyn SessionStore>,
    pub chain: ConversationalRetrievalChain,
    pub metrics: Metrics,
}

impl AppState {
    /// Production wiring:
    /// 1. Load and validate configuration
    /// 2. Build the embedding and chat providers
    /// 3. Open the persisted vector index without re-ingesting
    /// 4. Create the session store and the chain
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let llm: Arc<dyn LlmProvider> = Arc::new(
            OpenAiCompatProvider::from_config(&settings.llm)
                .map_err(|e| InitializationError::Llm(e.into()))?,
        );

        match llm.health_check().await {
            Ok(true) => tracing::info!(provider = llm.name(), "LLM provider reachable"),
            Ok(false) => tracing::warn!(provider = llm.name(), "LLM provider answered with an error status"),
            Err(err) => tracing::warn!(provider = llm.name(), error = %err, "LLM health check failed"),
        }

        let index = open_index(&paths, &settings).await?;
        let source = document_source(&paths, &settings);
        let index = Ingestor::new(index, source, &settings.ingest)
            .ingest(true)
            .await
            .map_err(|e| InitializationError::Ingest(e.into()))?;

        match index.count().await {
            Ok(0) => tracing::warn!(
                collection = %index.collection(),
                "vector index is empty; run the ingest binary to load reviews"
            ),
            Ok(documents) => tracing::info!(
                collection = %index.collection(),
                documents,
                "vector index loaded"
            ),
            Err(err) => tracing::warn!(error = %err, "could not count indexed documents"),
        }

        let sessions: Arc<dyn SessionStore> =
            Arc::new(InMemorySessionStore::from_config(&settings.sessions));

        Ok(Arc::new(Self::from_parts(
            paths, settings, llm, index, sessions,
        )))
    }

    /// Assembles state from already-built providers.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        settings: AppConfig,
        llm: Arc<dyn LlmProvider>,
        index: Arc<dyn VectorIndex>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let chain = ConversationalRetrievalChain::new(
            llm.clone(),
            index.clone(),
            sessions.clone(),
            ChainSettings::from_config(&settings),
        );

        Self {
            config: ConfigService::new(paths.clone()),
            paths,
            settings: Arc::new(settings),
            llm,
            index,
            sessions,
            chain,
            metrics: Metrics::new(),
        }
    }

    pub async fn handle_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<String, PipelineError> {
        let result = self.chain.answer(session_id, message).await;
        self.metrics.record_chat(result.is_ok());
        if let Err(err) = &result {
            tracing::warn!(session_id, error = %err, "chat request failed");
        }
        result
    }
}

/// Opens the SQLite index named by `vector_store`, embedding through the
/// configured provider.
pub async fn open_index(
    paths: &AppPaths,
    settings: &AppConfig,
) -> Result<Arc<dyn VectorIndex>, InitializationError> {
    let embedder = embedding::from_config(&settings.embedding)
        .map_err(|e| InitializationError::Embedding(e.into()))?;

    let db_path = match &settings.vector_store.path {
        Some(path) => resolve(&paths.user_data_dir, path),
        None => paths.vector_db_path.clone(),
    };

    let index = SqliteVectorIndex::with_path(
        db_path,
        settings.vector_store.collection.clone(),
        embedder,
    )
    .await
    .map_err(|e| InitializationError::VectorIndex(e.into()))?;

    tracing::info!(
        path = %index.db_path().display(),
        collection = %settings.vector_store.collection,
        "opened vector index"
    );
    Ok(Arc::new(index))
}

/// The review dataset; relative paths are taken from the project root.
pub fn document_source(paths: &AppPaths, settings: &AppConfig) -> Arc<dyn DocumentSource> {
    source_for_path(resolve(&paths.project_root, &settings.ingest.source_path))
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
