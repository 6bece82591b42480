//! Conversational retrieval chain.
//!
//! One call runs two stages against a locked session:
//!
//! 1. retrieval: rewrite the question into a standalone query when there is
//!    history, then take the index's top-k hits for it;
//! 2. synthesis: answer the original question from the hits and history.
//!
//! Turns are appended only after both stages succeed.

use std::sync::Arc;

use super::prompt::{answer_prompt, format_context, rewrite_prompt};
use crate::core::config::AppConfig;
use crate::core::errors::PipelineError;
use crate::history::{SessionStore, Turn};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::rag::{SearchHit, VectorIndex};

#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub top_k: usize,
    pub max_input_length: usize,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl ChainSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            max_input_length: config.app.max_input_length,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Output of the retrieval stage.
#[derive(Debug, Clone)]
pub struct Retrieval {
    /// The query sent to the index: the rewrite, or the raw input when the
    /// session had no history.
    pub query: String,
    pub hits: Vec<SearchHit>,
}

pub struct ConversationalRetrievalChain {
    llm: Arc<dyn LlmProvider>,
    index: Arc<dyn VectorIndex>,
    sessions: Arc<dyn SessionStore>,
    settings: ChainSettings,
}

impl ConversationalRetrievalChain {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        index: Arc<dyn VectorIndex>,
        sessions: Arc<dyn SessionStore>,
        settings: ChainSettings,
    ) -> Self {
        Self {
            llm,
            index,
            sessions,
            settings,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn top_k(&self) -> usize {
        self.settings.top_k
    }

    pub async fn answer(&self, session_id: &str, input: &str) -> Result<String, PipelineError> {
        self.validate_input(input)?;

        let handle = self.sessions.get_or_create(session_id);
        let mut session = handle.lock().await;

        let retrieval = self.retrieve(session.turns(), input).await?;
        let answer = self.synthesize(session.turns(), input, &retrieval.hits).await?;

        session.record_exchange(input, answer.clone());
        tracing::info!(
            session_id = session.id(),
            rewritten = retrieval.query != input,
            documents = retrieval.hits.len(),
            turns = session.len(),
            "answered"
        );

        Ok(answer)
    }

    /// Stage one: history-aware query rewrite plus top-k search.
    pub async fn retrieve(&self, history: &[Turn], input: &str) -> Result<Retrieval, PipelineError> {
        let query = if history.is_empty() {
            input.to_string()
        } else {
            self.rewrite(history, input).await?
        };

        let mut hits = self
            .index
            .search(&query, self.settings.top_k)
            .await
            .map_err(PipelineError::retrieval)?;
        hits.truncate(self.settings.top_k);

        tracing::debug!(query = %query, hits = hits.len(), "retrieved documents");
        Ok(Retrieval { query, hits })
    }

    async fn rewrite(&self, history: &[Turn], input: &str) -> Result<String, PipelineError> {
        let rewritten = self
            .complete(rewrite_prompt(history, input))
            .await
            .map_err(|e| PipelineError::generation(format!("query rewrite: {}", e)))?;

        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            tracing::warn!("query rewrite came back empty; searching with the raw input");
            return Ok(input.to_string());
        }
        Ok(rewritten.to_string())
    }

    /// Stage two: answer the original input from the retrieved context.
    async fn synthesize(
        &self,
        history: &[Turn],
        input: &str,
        hits: &[SearchHit],
    ) -> Result<String, PipelineError> {
        let context = format_context(hits);
        self.complete(answer_prompt(history, input, &context))
            .await
            .map_err(|e| PipelineError::generation(format!("answer synthesis: {}", e)))
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<String, crate::core::errors::ApiError> {
        let mut request = ChatRequest::new(messages);
        request.temperature = Some(self.settings.temperature);
        request.max_tokens = self.settings.max_tokens;
        self.llm.chat(request).await
    }

    fn validate_input(&self, input: &str) -> Result<(), PipelineError> {
        if input.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }
        let length = input.chars().count();
        if length > self.settings.max_input_length {
            return Err(PipelineError::InvalidInput(format!(
                "message is {} characters; the limit is {}",
                length, self.settings.max_input_length
            )));
        }
        Ok(())
    }
}
