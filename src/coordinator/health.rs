//! Per-dependency health accounting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Coarse health classification derived from the health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Score above 70.
    Healthy,
    /// Score between 31 and 70.
    Degraded,
    /// Score of 30 or below.
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Call and error counters for one external dependency.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceHealth {
    /// Attempts made against the dependency (including rate-limited ones).
    pub total_calls: u64,
    /// Attempts that failed.
    pub total_errors: u64,
    /// Failures since the last success.
    pub consecutive_errors: u32,
    /// When the dependency last answered successfully.
    pub last_success: Option<DateTime<Utc>>,
    /// The most recent failure reason.
    pub last_error: Option<String>,
}

impl ServiceHealth {
    /// Records one attempt. Called once per retry-loop iteration.
    pub fn record_attempt(&mut self) {
        self.total_calls += 1;
    }

    /// Records a success; resets the consecutive-error streak.
    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
        self.last_success = Some(Utc::now());
    }

    /// Records a failure with its reason.
    pub fn record_error(&mut self, reason: &str) {
        self.total_errors += 1;
        self.consecutive_errors += 1;
        self.last_error = Some(reason.to_string());
    }

    /// Health score in [0, 100]: each consecutive failure costs 20 points.
    pub fn score(&self) -> u32 {
        100u32.saturating_sub(20 * self.consecutive_errors)
    }

    /// Classifies the current score.
    pub fn status(&self) -> HealthStatus {
        match self.score() {
            s if s > 70 => HealthStatus::Healthy,
            s if s > 30 => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        }
    }
}
