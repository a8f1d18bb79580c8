//! External-service coordination: rate limiting, retries, health tracking.
//!
//! Every outbound call in the pipeline goes through [`ServiceCoordinator::execute`],
//! which runs the admission check, retries transient failures with exponential
//! backoff, and keeps per-dependency health counters. One coordinator instance
//! is constructed per pipeline and passed by reference into every call site;
//! there is no ambient global state.

use crate::coordinator::health::{HealthStatus, ServiceHealth};
use crate::coordinator::rate_limit::RateLimiter;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// The external dependencies governed by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// The text-generation capability (completions, structured completions).
    Llm,
    /// The filing data source (SEC EDGAR).
    Edgar,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Llm => write!(f, "llm"),
            ServiceKind::Edgar => write!(f, "edgar"),
        }
    }
}

/// Errors produced by coordinated service calls.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The sliding-window budget is exhausted. Transient; retried with backoff.
    #[error("{service} rate limit exceeded; retry in {wait_secs:.1}s")]
    RateLimited {
        /// Which dependency rejected the call.
        service: ServiceKind,
        /// Seconds until the oldest in-window timestamp expires.
        wait_secs: f64,
    },

    /// Timeout, connection failure, or a malformed/schema-invalid response.
    /// Transient; retried with backoff.
    #[error("transient service error: {0}")]
    Transient(String),

    /// Raised only after retries are exhausted; wraps the last underlying
    /// error as its cause.
    #[error("{service} call failed after {attempts} attempts")]
    Terminal {
        /// Which dependency failed.
        service: ServiceKind,
        /// Attempts made, including the first.
        attempts: usize,
        /// The last underlying error.
        #[source]
        source: Box<ServiceError>,
    },
}

impl ServiceError {
    /// Convenience constructor for transient failures.
    pub fn transient(message: impl Into<String>) -> Self {
        ServiceError::Transient(message.into())
    }
}

/// Rate-limit and retry configuration for one dependency.
#[derive(Debug, Clone)]
pub struct ServiceLimits {
    /// Sliding-window budget per minute.
    pub calls_per_minute: usize,
    /// Sliding-window budget per hour.
    pub calls_per_hour: usize,
    /// Retries after the first attempt.
    pub max_retries: usize,
    /// Backoff starts here and doubles per attempt.
    pub base_delay: Duration,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self {
            calls_per_minute: 60,
            calls_per_hour: 1000,
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Point-in-time health view of one dependency.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    /// The dependency this snapshot describes.
    pub service: ServiceKind,
    /// Health score in [0, 100].
    pub score: u32,
    /// Coarse classification of the score.
    pub status: HealthStatus,
    /// Raw counters.
    pub health: ServiceHealth,
}

/// Limiter and counters for one dependency. Locked as a unit so admission
/// and accounting stay consistent; the lock is never held across an await.
struct ServiceState {
    limiter: RateLimiter,
    health: ServiceHealth,
    limits: ServiceLimits,
}

impl ServiceState {
    fn new(limits: ServiceLimits) -> Self {
        Self {
            limiter: RateLimiter::new(limits.calls_per_minute, limits.calls_per_hour),
            health: ServiceHealth::default(),
            limits,
        }
    }
}

/// Wraps calls to both external dependencies with admission control,
/// retry with exponential backoff, and health accounting.
pub struct ServiceCoordinator {
    llm: Mutex<ServiceState>,
    edgar: Mutex<ServiceState>,
}

impl ServiceCoordinator {
    /// Creates a coordinator with independent limits per dependency.
    pub fn new(llm_limits: ServiceLimits, edgar_limits: ServiceLimits) -> Self {
        Self {
            llm: Mutex::new(ServiceState::new(llm_limits)),
            edgar: Mutex::new(ServiceState::new(edgar_limits)),
        }
    }

    fn state(&self, service: ServiceKind) -> &Mutex<ServiceState> {
        match service {
            ServiceKind::Llm => &self.llm,
            ServiceKind::Edgar => &self.edgar,
        }
    }

    /// Runs `op` against the named dependency under the resilience policy.
    ///
    /// Sequence per attempt: record the attempt, run the admission check,
    /// invoke the call, and record the timestamp in both windows on success.
    /// Rate-limit rejections and transient errors are both retried with
    /// `base_delay * 2^attempt` sleeps; after `max_retries` retries the last
    /// underlying error is wrapped in [`ServiceError::Terminal`].
    pub async fn execute<T, F, Fut>(&self, service: ServiceKind, op: F) -> Result<T, ServiceError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let (max_retries, base_delay) = {
            let state = self.state(service).lock().expect("coordinator lock poisoned");
            (state.limits.max_retries, state.limits.base_delay)
        };

        let attempts = max_retries + 1;
        let mut last_error: Option<ServiceError> = None;

        for attempt in 0..attempts {
            let admission = {
                let mut state = self.state(service).lock().expect("coordinator lock poisoned");
                state.health.record_attempt();
                state.limiter.check()
            };

            let outcome = match admission {
                Ok(()) => op().await,
                Err(wait) => Err(ServiceError::RateLimited {
                    service,
                    wait_secs: wait.as_secs_f64(),
                }),
            };

            match outcome {
                Ok(value) => {
                    let mut state =
                        self.state(service).lock().expect("coordinator lock poisoned");
                    state.limiter.record();
                    state.health.record_success();
                    debug!(service = %service, attempt, "call succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    {
                        let mut state =
                            self.state(service).lock().expect("coordinator lock poisoned");
                        state.health.record_error(&err.to_string());
                    }

                    let is_last = attempt + 1 == attempts;
                    if is_last {
                        warn!(service = %service, attempt, error = %err, "retries exhausted");
                    } else {
                        let delay = base_delay * 2u32.saturating_pow(attempt as u32);
                        warn!(
                            service = %service,
                            attempt,
                            error = %err,
                            "call failed; retrying in {:.1}s",
                            delay.as_secs_f64()
                        );
                        last_error = Some(err);
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    last_error = Some(err);
                }
            }
        }

        Err(ServiceError::Terminal {
            service,
            attempts,
            source: Box::new(
                last_error.unwrap_or_else(|| ServiceError::transient("no attempts made")),
            ),
        })
    }

    /// Snapshots the health of one dependency.
    pub fn health(&self, service: ServiceKind) -> HealthSnapshot {
        let state = self.state(service).lock().expect("coordinator lock poisoned");
        HealthSnapshot {
            service,
            score: state.health.score(),
            status: state.health.status(),
            health: state.health.clone(),
        }
    }

    /// Snapshots the health of every governed dependency.
    pub fn health_report(&self) -> Vec<HealthSnapshot> {
        vec![
            self.health(ServiceKind::Llm),
            self.health(ServiceKind::Edgar),
        ]
    }
}
