//! The text-generation capability seam.
//!
//! The pipeline only ever talks to a [`CompletionProvider`] trait object, so
//! the orchestration core stays agnostic to which backend produces text.
//! A bundled Ollama-compatible implementation lives in [`ollama`].

pub mod ollama;

use crate::coordinator::ServiceError;
use async_trait::async_trait;
use serde_json::Value;

pub use ollama::{OllamaConfig, OllamaProvider};

/// One completion call: a system framing plus the user prompt.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt establishing the analyst role.
    pub system: String,
    /// The task prompt.
    pub prompt: String,
}

impl CompletionRequest {
    /// Creates a request.
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
        }
    }
}

/// An external text-generation capability.
///
/// Implementations map their transport failures to
/// [`ServiceError::Transient`]; retry policy belongs to the coordinator,
/// not the provider.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Unstructured free-text completion. Used for excerpt extraction.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError>;

    /// Structured completion constrained to the given JSON schema.
    ///
    /// Returns the parsed response object; a response that fails to parse as
    /// JSON is a transient error.
    async fn complete_structured(
        &self,
        request: CompletionRequest,
        schema: Value,
    ) -> Result<Value, ServiceError>;
}
