use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use valvey_core::config::{LlmConfig, LlmProvider};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const SYSTEM_PROMPT: &str = "You are a procurement analyst for shipbuilding and offshore \
valves. Answer concisely and only from the figures provided.";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm http client could not be built: {0}")]
    Client(String),
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm endpoint returned status {status}")]
    Status { status: u16 },
    #[error("llm response could not be decoded: {0}")]
    Decode(String),
    #[error("llm response contained no text")]
    EmptyResponse,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Builds the configured client, or `None` when narratives are disabled or
/// the provider lacks credentials.
pub fn client_from_config(config: &LlmConfig) -> Result<Option<Arc<dyn LlmClient>>, LlmError> {
    if !config.is_ready() {
        return Ok(None);
    }
    let timeout = Duration::from_secs(config.timeout_secs);
    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Anthropic => {
            let Some(api_key) = config.api_key.clone() else {
                return Ok(None);
            };
            Arc::new(AnthropicClient::new(
                api_key,
                config.base_url.clone().unwrap_or_else(|| "https://api.anthropic.com".to_string()),
                config.model.clone(),
                config.max_tokens,
                timeout,
            )?)
        }
        LlmProvider::Ollama => Arc::new(OllamaClient::new(
            config.base_url.clone().unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            config.model.clone(),
            timeout,
        )?),
    };
    Ok(Some(client))
}

fn http_client(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder().timeout(timeout).build().map_err(|error| LlmError::Client(error.to_string()))
}

pub struct AnthropicClient {
    http: Client,
    api_key: SecretString,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl AnthropicClient {
    pub fn new(
        api_key: SecretString,
        base_url: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let endpoint = format!("{}/v1/messages", base_url.trim_end_matches('/'));
        Ok(Self { http: http_client(timeout)?, api_key, endpoint, model, max_tokens })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: SYSTEM_PROMPT,
            messages: [Message { role: "user", content: prompt }],
        };
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::Status { status: response.status().as_u16() });
        }
        let payload: Value =
            response.json().await.map_err(|error| LlmError::Decode(error.to_string()))?;
        anthropic_text(&payload)
    }
}

/// Joins the `text` content blocks of a messages response.
pub fn anthropic_text(payload: &Value) -> Result<String, LlmError> {
    let blocks = payload
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| LlmError::Decode("missing `content` array".to_string()))?;
    let text = blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n");
    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

pub struct OllamaClient {
    http: Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let endpoint = format!("{}/api/generate", base_url.trim_end_matches('/'));
        Ok(Self { http: http_client(timeout)?, endpoint, model })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body =
            GenerateRequest { model: &self.model, system: SYSTEM_PROMPT, prompt, stream: false };
        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(LlmError::Status { status: response.status().as_u16() });
        }
        let payload: GenerateResponse =
            response.json().await.map_err(|error| LlmError::Decode(error.to_string()))?;
        if payload.response.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(payload.response)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{anthropic_text, client_from_config, LlmError};
    use valvey_core::config::AppConfig;

    #[test]
    fn text_blocks_are_joined_and_tool_blocks_ignored() {
        let payload = json!({
            "content": [
                {"type": "text", "text": "first"},
                {"type": "tool_use", "name": "lookup"},
                {"type": "text", "text": "second"}
            ]
        });
        assert_eq!(anthropic_text(&payload).expect("text"), "first\nsecond");
    }

    #[test]
    fn blank_response_is_an_error() {
        let payload = json!({ "content": [{"type": "text", "text": "  "}] });
        assert!(matches!(anthropic_text(&payload), Err(LlmError::EmptyResponse)));
        assert!(matches!(anthropic_text(&json!({})), Err(LlmError::Decode(_))));
    }

    #[test]
    fn no_client_without_api_key() {
        let config = AppConfig::default();
        assert!(client_from_config(&config.llm).expect("config").is_none());
    }

    #[test]
    fn client_is_built_when_key_is_present() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-test".to_string().into());
        assert!(client_from_config(&config.llm).expect("config").is_some());
    }
}
