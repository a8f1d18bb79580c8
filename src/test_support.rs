//! Test doubles shared across module tests.

use crate::config::AnalysisConfig;
use crate::context::RunContext;
use crate::coordinator::{ServiceCoordinator, ServiceError, ServiceLimits};
use crate::provider::{CompletionProvider, CompletionRequest};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Failure schedule for the mock provider, applied per call.
pub enum FailEvery {
    Never,
    Always,
    /// Fail the first N calls, then succeed.
    First(usize),
}

/// A scriptable [`CompletionProvider`] for exercising the pipeline without
/// a live endpoint.
pub struct MockProvider {
    completion: String,
    failures: FailEvery,
    fail_substrings: Vec<String>,
    delays: Vec<(String, Duration)>,
    first_structured: Option<Value>,
    calls: AtomicUsize,
    structured_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            completion: "extracted excerpt".to_string(),
            failures: FailEvery::Never,
            fail_substrings: Vec::new(),
            delays: Vec::new(),
            first_structured: None,
            calls: AtomicUsize::new(0),
            structured_calls: AtomicUsize::new(0),
        }
    }

    /// Fixed response for unstructured completions.
    pub fn with_completion(mut self, text: &str) -> Self {
        self.completion = text.to_string();
        self
    }

    /// Applies a call-count failure schedule.
    pub fn with_failures(mut self, failures: FailEvery) -> Self {
        self.failures = failures;
        self
    }

    /// Fails every call whose prompt contains the given marker.
    pub fn failing_when_prompt_contains(mut self, marker: &str) -> Self {
        self.fail_substrings.push(marker.to_string());
        self
    }

    /// Sleeps before answering calls whose prompt contains the marker.
    pub fn with_delay_for(mut self, marker: &str, delay: Duration) -> Self {
        self.delays.push((marker.to_string(), delay));
        self
    }

    /// Returns the given value for the first structured call, then valid
    /// synthesized records.
    pub fn with_structured_then_valid(mut self, first: Value) -> Self {
        self.first_structured = Some(first);
        self
    }

    /// Total calls observed (both capabilities).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn apply_delay(&self, prompt: &str) {
        for (marker, delay) in &self.delays {
            if prompt.contains(marker) {
                tokio::time::sleep(*delay).await;
            }
        }
    }

    fn check_failure(&self, prompt: &str) -> Result<(), ServiceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_substrings.iter().any(|m| prompt.contains(m)) {
            return Err(ServiceError::transient("injected failure"));
        }

        match self.failures {
            FailEvery::Never => Ok(()),
            FailEvery::Always => Err(ServiceError::transient("injected failure")),
            FailEvery::First(count) if n < count => {
                Err(ServiceError::transient("injected failure"))
            }
            FailEvery::First(_) => Ok(()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a record satisfying the given analysis schema: one value per
/// declared property, typed to match.
pub fn synthesize_record(schema: &Value) -> Value {
    let mut object = serde_json::Map::new();

    if let Some(properties) = schema["properties"].as_object() {
        for (name, property) in properties {
            let value = match property["type"].as_str() {
                Some("array") => json!(["first point", "second point"]),
                Some("number") => json!(0.25),
                Some("boolean") => json!(false),
                _ => json!(format!("analysis of {}", name)),
            };
            object.insert(name.clone(), value);
        }
    }

    Value::Object(object)
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
        self.apply_delay(&request.prompt).await;
        self.check_failure(&request.prompt)?;
        Ok(self.completion.clone())
    }

    async fn complete_structured(
        &self,
        request: CompletionRequest,
        schema: Value,
    ) -> Result<Value, ServiceError> {
        self.apply_delay(&request.prompt).await;
        self.check_failure(&request.prompt)?;

        let n = self.structured_calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            if let Some(first) = &self.first_structured {
                return Ok(first.clone());
            }
        }

        Ok(synthesize_record(&schema))
    }
}

/// Generous limits so tests exercise orchestration, not admission.
pub fn test_limits() -> ServiceLimits {
    ServiceLimits {
        calls_per_minute: 10_000,
        calls_per_hour: 100_000,
        max_retries: 1,
        base_delay: Duration::from_millis(10),
    }
}

/// Builds a run context around the given mock.
pub fn test_context(provider: MockProvider) -> RunContext {
    test_context_shared(Arc::new(provider))
}

/// Builds a run context around a shared mock, keeping the handle so tests
/// can inspect call counts.
pub fn test_context_shared(provider: Arc<MockProvider>) -> RunContext {
    RunContext {
        coordinator: Arc::new(ServiceCoordinator::new(test_limits(), test_limits())),
        provider,
        company_name: "Acme Corp".to_string(),
        filing_type: "10-K".to_string(),
        analysis: AnalysisConfig::default(),
    }
}
