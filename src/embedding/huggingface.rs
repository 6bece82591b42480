//! Hugging Face inference endpoint (`feature-extraction` pipeline).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::EmbeddingProvider;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct HuggingFaceEmbeddings {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl HuggingFaceEmbeddings {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}/pipeline/feature-extraction",
            self.base_url, self.model
        )
    }
}

/// Accepts both sentence-level (`[[f32]]`) and token-level (`[[[f32]]]`)
/// responses; token-level output is mean-pooled.
fn parse_feature_extraction(payload: &Value, expected: usize) -> Result<Vec<Vec<f32>>, ApiError> {
    let rows = payload.as_array().ok_or_else(|| {
        ApiError::BadGateway("feature-extraction response is not an array".to_string())
    })?;

    let mut vectors = Vec::with_capacity(rows.len());
    for row in rows {
        let items = row.as_array().ok_or_else(|| {
            ApiError::BadGateway("feature-extraction row is not an array".to_string())
        })?;
        let vector = if items.first().map(|v| v.is_array()).unwrap_or(false) {
            mean_pool(items)?
        } else {
            to_f32_vec(items)?
        };
        vectors.push(vector);
    }

    if vectors.len() != expected {
        return Err(ApiError::BadGateway(format!(
            "expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }
    Ok(vectors)
}

fn to_f32_vec(items: &[Value]) -> Result<Vec<f32>, ApiError> {
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| ApiError::BadGateway("non-numeric embedding value".to_string()))
        })
        .collect()
}

fn mean_pool(tokens: &[Value]) -> Result<Vec<f32>, ApiError> {
    let mut sum: Vec<f32> = Vec::new();
    for token in tokens {
        let values = to_f32_vec(token.as_array().map(Vec::as_slice).unwrap_or(&[]))?;
        if sum.is_empty() {
            sum = values;
            continue;
        }
        if values.len() != sum.len() {
            return Err(ApiError::BadGateway(
                "token embeddings have mismatched dimensions".to_string(),
            ));
        }
        for (acc, v) in sum.iter_mut().zip(values) {
            *acc += v;
        }
    }
    let count = tokens.len().max(1) as f32;
    Ok(sum.into_iter().map(|v| v / count).collect())
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbeddings {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ApiError::BadGateway("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(model = %self.model, batch_size = texts.len(), "embedding batch");

        let mut builder = self.client.post(self.endpoint()).json(&json!({
            "inputs": texts,
        }));
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let res = builder
            .send()
            .await
            .map_err(|e| ApiError::BadGateway(format!("huggingface request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::BadGateway(format!(
                "huggingface embed error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::BadGateway(format!("huggingface returned invalid JSON: {}", e)))?;

        parse_feature_extraction(&payload, texts.len())
    }
}
