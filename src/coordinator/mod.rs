//! Resilience layer shared by every external call.
//!
//! This module provides sliding-window rate limiting, retry with exponential
//! backoff, and per-dependency health tracking.

pub mod health;
pub mod rate_limit;
pub mod service;

pub use health::{HealthStatus, ServiceHealth};
pub use rate_limit::RateLimiter;
pub use service::{HealthSnapshot, ServiceCoordinator, ServiceError, ServiceKind, ServiceLimits};
