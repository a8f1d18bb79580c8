//! Shared state for one filing-analysis run.

use crate::config::AnalysisConfig;
use crate::coordinator::ServiceCoordinator;
use crate::provider::CompletionProvider;
use std::sync::Arc;

/// Everything a pipeline task needs, assembled once per
/// [`crate::orchestrator::FilingAnalyzer::analyze_filing`] invocation and
/// shared across concurrent tasks behind an `Arc`.
///
/// The coordinator is the only member holding state mutated across tasks;
/// the rest is read-only for the duration of the run.
pub struct RunContext {
    /// The resilience layer shared by every external call.
    pub coordinator: Arc<ServiceCoordinator>,
    /// The text-generation capability.
    pub provider: Arc<dyn CompletionProvider>,
    /// Company the filing belongs to; flows into every prompt.
    pub company_name: String,
    /// Filing type (e.g. "10-K").
    pub filing_type: String,
    /// Degradation constants and summarization retry policy.
    pub analysis: AnalysisConfig,
}

impl RunContext {
    /// Truncates text to the configured prompt budget on a char boundary.
    pub fn clip_for_prompt<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.analysis.max_prompt_chars) {
            Some((byte_index, _)) => &text[..byte_index],
            None => text,
        }
    }
}
