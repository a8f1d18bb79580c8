//! Ollama-compatible completion provider.
//!
//! Speaks the Ollama chat API. Structured completions use the `format`
//! field, which constrains the response to a caller-supplied JSON schema.

use crate::coordinator::ServiceError;
use crate::provider::{CompletionProvider, CompletionRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Connection settings for the Ollama endpoint.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Ollama API URL.
    pub url: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature; low values keep analyses consistent.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "llama3.2:latest".to_string(),
            temperature: 0.1,
            timeout_seconds: 300,
        }
    }
}

/// Chat message in the Ollama API shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    /// JSON schema for structured output; omitted for free-text calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// [`CompletionProvider`] backed by an Ollama-compatible endpoint.
pub struct OllamaProvider {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaProvider {
    /// Creates a provider with its own HTTP client.
    pub fn new(config: OllamaConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    /// Sends one chat request and returns the response content.
    async fn chat(
        &self,
        request: &CompletionRequest,
        format: Option<Value>,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/api/chat", self.config.url);

        let body = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            stream: false,
            format,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!(model = %self.config.model, "sending chat request");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::transient(format!(
                        "request timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    ServiceError::transient(format!("cannot connect to Ollama at {}", self.config.url))
                } else {
                    ServiceError::transient(format!("failed to send request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::transient(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::transient(format!("failed to parse Ollama response: {}", e)))?;

        Ok(chat_response.message.content)
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
        self.chat(&request, None).await
    }

    async fn complete_structured(
        &self,
        request: CompletionRequest,
        schema: Value,
    ) -> Result<Value, ServiceError> {
        let content = self.chat(&request, Some(schema)).await?;

        serde_json::from_str(&content).map_err(|e| {
            ServiceError::transient(format!("structured response is not valid JSON: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = OllamaConfig::default();
        assert_eq!(config.url, "http://localhost:11434");
        assert_eq!(config.model, "llama3.2:latest");
        assert!(config.temperature <= 0.2);
    }

    #[test]
    fn test_request_serialization_omits_empty_format() {
        let request = OllamaChatRequest {
            model: "llama3.2:latest".to_string(),
            messages: vec![],
            stream: false,
            format: None,
            options: OllamaOptions { temperature: 0.1 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("format").is_none());

        let structured = OllamaChatRequest {
            model: "llama3.2:latest".to_string(),
            messages: vec![],
            stream: false,
            format: Some(serde_json::json!({"type": "object"})),
            options: OllamaOptions { temperature: 0.1 },
        };
        let json = serde_json::to_value(&structured).unwrap();
        assert_eq!(json["format"]["type"], "object");
    }
}
