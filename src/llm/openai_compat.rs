use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::config::settings::LlmSection;
use crate::core::errors::ApiError;

/// Chat client for any OpenAI-compatible `/v1/chat/completions` endpoint
/// (Groq, OpenAI, LM Studio, vLLM).
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let name = if base_url.contains("groq.com") {
            "groq"
        } else {
            "openai_compat"
        }
        .to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            name,
            base_url,
            model,
            api_key,
            client,
        })
    }

    pub fn from_config(config: &LlmSection) -> Result<Self, ApiError> {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) if !key.is_empty() => builder.bearer_auth(key),
            _ => builder,
        }
    }
}

fn build_chat_body(request: &ChatRequest, model_id: &str) -> Value {
    let mut body = json!({
        "model": model_id,
        "messages": request.messages,
        "stream": false,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature { obj.insert("temperature".to_string(), json!(t)); }
        if let Some(t) = request.max_tokens { obj.insert("max_tokens".to_string(), json!(t)); }
    }

    body
}

fn extract_content(payload: &Value) -> Result<String, ApiError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.to_string())
        .ok_or_else(|| ApiError::BadGateway("chat response missing choices[0].message.content".to_string()))
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/v1/models", self.base_url);
        let res = self.authorized(self.client.get(&url)).send().await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = build_chat_body(&request, &self.model);

        tracing::debug!(
            provider = %self.name,
            model = %self.model,
            messages = request.messages.len(),
            "chat completion request"
        );

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::BadGateway(format!("{} request failed: {}", self.name, e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::BadGateway(format!(
                "{} chat error ({}): {}",
                self.name, status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::BadGateway(format!("{} returned invalid JSON: {}", self.name, e)))?;

        extract_content(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;

    #[test]
    fn chat_body_carries_sampling_options() {
        let mut request = ChatRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
        ]);
        request.temperature = Some(0.5);
        request.max_tokens = Some(64);

        let body = build_chat_body(&request, "llama-3.1-8b-instant");

        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["stream"], false);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn missing_content_is_a_gateway_error() {
        let ok = json!({ "choices": [{ "message": { "role": "assistant", "content": "Yes." } }] });
        assert_eq!(extract_content(&ok).unwrap(), "Yes.");

        let malformed = json!({ "choices": [] });
        assert!(matches!(
            extract_content(&malformed),
            Err(ApiError::BadGateway(_))
        ));
    }

    #[test]
    fn provider_name_follows_host() {
        let groq = OpenAiCompatProvider::new(
            "https://api.groq.com/openai/".to_string(),
            "m".to_string(),
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(groq.name(), "groq");
        assert_eq!(groq.base_url, "https://api.groq.com/openai");

        let local = OpenAiCompatProvider::new(
            "http://localhost:1234".to_string(),
            "m".to_string(),
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(local.name(), "openai_compat");
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_groq_connection() {
        let Ok(key) = std::env::var("GROQ_API_KEY") else {
            return;
        };
        let provider = OpenAiCompatProvider::from_config(&LlmSection {
            api_key: Some(key),
            ..LlmSection::default()
        })
        .unwrap();

        let req = ChatRequest::new(vec![ChatMessage::user("Hello")]);
        match provider.chat(req).await {
            Ok(response) => println!("Groq Chat Response: {}", response),
            Err(e) => panic!("Groq Chat Error: {}", e),
        }
    }
}
