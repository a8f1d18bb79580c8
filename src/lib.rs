//! FilingLens - LLM-powered SEC filing analysis.
//!
//! A hierarchical, schema-driven filing analyzer: each section of a filing
//! is decomposed into schema-declared subsections, analyzed concurrently
//! with structured LLM completions, and aggregated back into section and
//! filing-level summaries. Every external call runs through a shared
//! rate-limiting, retry, and health-tracking coordinator.
//!
//! Failures degrade instead of propagating: a failed subsection keeps its
//! slot with a failure note, a failed summarization keeps every computed
//! child result, and callers always receive a complete [`FilingResult`]
//! graph.
//!
//! ```rust,ignore
//! use filinglens::{Config, FilingAnalyzer, Section};
//!
//! let analyzer = FilingAnalyzer::from_config(Config::default());
//! let result = analyzer
//!     .analyze_filing(
//!         "Acme Corp",
//!         "10-K",
//!         vec![
//!             Section::new("Item 1. Business", business_text),
//!             Section::new("Item 1A. Risk Factors", risk_text),
//!         ],
//!     )
//!     .await;
//! println!("{}", result.executive_summary);
//! ```

pub mod config;
pub mod context;
pub mod coordinator;
pub mod extraction;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod schema;
pub mod sentiment;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use coordinator::{
    HealthSnapshot, HealthStatus, ServiceCoordinator, ServiceError, ServiceKind, ServiceLimits,
};
pub use models::{
    AnalysisTotals, FilingResult, Section, SectionResult, SubsectionAnalysis, SubsectionResult,
};
pub use orchestrator::FilingAnalyzer;
pub use provider::{CompletionProvider, CompletionRequest, OllamaConfig, OllamaProvider};
pub use sentiment::score_sentiment;
