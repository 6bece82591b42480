//! In-process fakes shared by unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::errors::{ApiError, PipelineError};
use crate::embedding::EmbeddingProvider;
use crate::llm::{ChatRequest, LlmProvider};
use crate::rag::{Document, DocumentSource, SearchHit, VectorIndex, TITLE_KEY};

pub fn review_doc(title: &str, text: &str) -> Document {
    let mut metadata = BTreeMap::new();
    metadata.insert(TITLE_KEY.to_string(), title.to_string());
    Document::new(text, metadata)
}

pub fn review_hit(title: &str, text: &str, score: f32) -> SearchHit {
    SearchHit {
        document: review_doc(title, text),
        score,
    }
}

/// Bag-of-words embedder over a fixed vocabulary: dimension `i` counts
/// occurrences of `vocab[i]` among the lowercase alphanumeric tokens.
pub struct KeywordEmbeddings {
    vocab: Vec<String>,
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
    failing: AtomicBool,
}

impl KeywordEmbeddings {
    pub fn new(vocab: &[&str]) -> Self {
        Self {
            vocab: vocab.iter().map(|w| w.to_lowercase()).collect(),
            calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed` plus `embed_batch` invocations.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        self.vocab
            .iter()
            .map(|word| tokens.iter().filter(|t| **t == word.as_str()).count() as f32)
            .collect()
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::BadGateway("embedding backend unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbeddings {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.batch_sizes.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

pub struct StaticSource {
    docs: Vec<Document>,
    loads: AtomicUsize,
}

impl StaticSource {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    fn describe(&self) -> String {
        format!("{} static documents", self.docs.len())
    }

    async fn load(&self) -> Result<Vec<Document>, PipelineError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.clone())
    }
}

/// Scripted chat model. Replies are consumed in order; in echo mode an
/// exhausted script answers `re: <last message>`.
pub struct FakeLlm {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    echo: bool,
    delay: Option<Duration>,
}

impl FakeLlm {
    pub fn scripted(replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            script: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
            echo: false,
            delay: None,
        }
    }

    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::scripted(Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for FakeLlm {
    fn name(&self) -> &str {
        "fake"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(ApiError::BadGateway(message)),
            None if self.echo => Ok(format!("re: {}", last)),
            None => Err(ApiError::BadGateway("script exhausted".to_string())),
        }
    }
}

/// Index returning a fixed hit list regardless of `k`.
pub struct FakeIndex {
    hits: Vec<SearchHit>,
    queries: Mutex<Vec<String>>,
    requested_k: Mutex<Vec<usize>>,
    failing: AtomicBool,
}

impl FakeIndex {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            queries: Mutex::new(Vec::new()),
            requested_k: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn requested_k(&self) -> Vec<usize> {
        self.requested_k.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    fn collection(&self) -> &str {
        "fake"
    }

    async fn upsert(&self, documents: &[Document]) -> Result<usize, ApiError> {
        Ok(documents.len())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, ApiError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.requested_k.lock().unwrap().push(k);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::BadGateway("vector store unreachable".to_string()));
        }
        Ok(self.hits.clone())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Ok(self.hits.len())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        Ok(())
    }
}
