//! Section-level analysis and summarization.
//!
//! A section task discovers its subsections, runs the concurrent fan-out,
//! and aggregates the results into one [`SectionResult`] with a structured
//! summarization call. Summarization has its own retry policy; when it is
//! exhausted the section degrades to a minimal result that still carries
//! every computed subsection.

use crate::context::RunContext;
use crate::coordinator::{ServiceError, ServiceKind};
use crate::models::{Section, SectionResult, SubsectionAnalysis, SubsectionResult};
use crate::orchestrator::subsection::analyze_section_subsections;
use crate::provider::CompletionRequest;
use crate::schema::{discover_subsections, schema_for_section};
use crate::sentiment::score_sentiment;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

const SECTION_SUMMARY_SYSTEM_PROMPT: &str = "You are a financial filing analyst. \
Aggregate the provided subsection analyses into one section-level summary. \
Respond with the requested JSON object.";

/// The structured record a section summarization call must produce.
#[derive(Debug, Deserialize)]
struct SectionSummaryRecord {
    summary: String,
    #[serde(default)]
    insights: Vec<String>,
    #[serde(default)]
    sentiment: Option<f64>,
    #[serde(default)]
    critical_findings: Vec<String>,
}

fn section_summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": {
                "type": "string",
                "description": "Narrative summary of the section"
            },
            "insights": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Ordered insights, most material first"
            },
            "sentiment": {
                "type": "number",
                "description": "Section sentiment from -1.0 to 1.0"
            },
            "critical_findings": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Findings that warrant immediate attention"
            }
        },
        "required": ["summary"]
    })
}

/// Analyzes one filing section end to end.
///
/// Unrecognized section names skip subsection decomposition and run a single
/// generic whole-section analysis instead.
pub async fn analyze_section(ctx: &Arc<RunContext>, section: &Section) -> SectionResult {
    let started = Instant::now();

    let subsections = match schema_for_section(&section.name) {
        Some(schema) => discover_subsections(&schema),
        None => {
            debug!(
                section = %section.name,
                "section not in registry; skipping subsection decomposition"
            );
            Vec::new()
        }
    };

    let subsection_results = analyze_section_subsections(ctx, section, subsections).await;

    match summarize_with_retry(ctx, section, &subsection_results).await {
        Ok(record) => {
            let sentiment = resolve_sentiment(record.sentiment, &subsection_results);
            SectionResult {
                section_name: section.name.clone(),
                summary_text: record.summary,
                insights: record.insights,
                sentiment,
                critical_findings: record.critical_findings,
                subsections: subsection_results,
                processing_time: started.elapsed().as_secs_f64(),
            }
        }
        Err(err) => {
            warn!(
                section = %section.name,
                error = %err,
                "section summarization exhausted; returning minimal result"
            );
            SectionResult::fallback(
                section.name.clone(),
                subsection_results,
                started.elapsed().as_secs_f64(),
            )
        }
    }
}

/// Retries summarization with exponential backoff before giving up.
async fn summarize_with_retry(
    ctx: &Arc<RunContext>,
    section: &Section,
    results: &[SubsectionResult],
) -> Result<SectionSummaryRecord, ServiceError> {
    let max_attempts = ctx.analysis.summary_max_attempts.max(1);
    let base_delay = ctx.analysis.summary_base_delay();
    let mut last_error = None;

    for attempt in 0..max_attempts {
        match summarize_once(ctx, section, results).await {
            Ok(record) => return Ok(record),
            Err(err) => {
                if attempt + 1 < max_attempts {
                    let delay = base_delay * 2u32.saturating_pow(attempt as u32);
                    warn!(
                        section = %section.name,
                        attempt,
                        error = %err,
                        "section summarization failed; retrying in {:.1}s",
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(err);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| ServiceError::transient("no summarization attempts made")))
}

async fn summarize_once(
    ctx: &Arc<RunContext>,
    section: &Section,
    results: &[SubsectionResult],
) -> Result<SectionSummaryRecord, ServiceError> {
    let prompt = build_section_summary_prompt(ctx, section, results);
    let request = CompletionRequest::new(SECTION_SUMMARY_SYSTEM_PROMPT, prompt);
    let schema = section_summary_schema();
    let provider = Arc::clone(&ctx.provider);

    ctx.coordinator
        .execute(ServiceKind::Llm, || {
            let provider = Arc::clone(&provider);
            let request = request.clone();
            let schema = schema.clone();
            async move {
                let value = provider.complete_structured(request, schema).await?;
                serde_json::from_value(value).map_err(|e| {
                    ServiceError::transient(format!("section summary record invalid: {}", e))
                })
            }
        })
        .await
}

fn build_section_summary_prompt(
    ctx: &RunContext,
    section: &Section,
    results: &[SubsectionResult],
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Aggregate the subsection analyses for section {} of the {} filing by {}.\n\n",
        section.name, ctx.filing_type, ctx.company_name
    ));

    for result in results {
        prompt.push_str(&format!("### {}\n", result.subsection_name));
        match &result.analysis {
            SubsectionAnalysis::Structured { record, .. }
            | SubsectionAnalysis::Generic { record } => {
                prompt.push_str(&record.to_string());
                prompt.push('\n');
            }
            SubsectionAnalysis::Failed { reason } => {
                prompt.push_str(&format!("(analysis unavailable: {})\n", reason));
            }
        }
        prompt.push('\n');
    }

    prompt.push_str("Summarize the section from the analyses above.");
    prompt
}

/// The LLM-produced sentiment is primary; the keyword heuristic over the
/// subsection analyses substitutes when it is missing or out of range.
fn resolve_sentiment(llm_sentiment: Option<f64>, results: &[SubsectionResult]) -> f64 {
    match llm_sentiment {
        Some(s) if (-1.0..=1.0).contains(&s) => s,
        _ => score_sentiment(&analysis_corpus(results)),
    }
}

/// Joins the textual content of successful analyses for keyword scoring.
fn analysis_corpus(results: &[SubsectionResult]) -> String {
    let mut corpus = String::new();
    for result in results {
        if let SubsectionAnalysis::Structured { record, .. }
        | SubsectionAnalysis::Generic { record } = &result.analysis
        {
            if let Some(object) = record.as_object() {
                for value in object.values() {
                    match value {
                        Value::String(text) => {
                            corpus.push_str(text);
                            corpus.push(' ');
                        }
                        Value::Array(items) => {
                            for item in items {
                                if let Some(text) = item.as_str() {
                                    corpus.push_str(text);
                                    corpus.push(' ');
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
    corpus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context, MockProvider};

    const MDNA_TITLE: &str = "Item 7. Management's Discussion and Analysis";

    #[tokio::test(start_paused = true)]
    async fn test_known_section_produces_full_result() {
        let ctx = Arc::new(test_context(MockProvider::new()));
        let section = Section::new(MDNA_TITLE, "Revenue increased 12% year over year.");

        let result = analyze_section(&ctx, &section).await;

        // MD&A declares four record subsections.
        assert_eq!(result.subsections.len(), 4);
        assert!(result.subsections.iter().all(|s| s.succeeded()));
        assert!(!result.summary_text.is_empty());
        // The mock reports 0.25 for number fields; the LLM value is primary.
        assert_eq!(result.sentiment, 0.25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summarization_failure_keeps_subsections() {
        let provider =
            MockProvider::new().failing_when_prompt_contains("Aggregate the subsection analyses");
        let ctx = Arc::new(test_context(provider));
        let section = Section::new(MDNA_TITLE, "Revenue increased 12% year over year.");

        let result = analyze_section(&ctx, &section).await;

        // Aggregation failure never discards child work.
        assert_eq!(result.subsections.len(), 4);
        assert!(result.subsections.iter().all(|s| s.succeeded()));
        assert_eq!(result.sentiment, 0.0);
        assert!(result.insights.is_empty());
        assert!(result.summary_text.contains("unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_section_skips_decomposition() {
        let ctx = Arc::new(test_context(MockProvider::new()));
        let section = Section::new(
            "Item 5. Market for Registrant's Common Equity",
            "Common stock trades on NASDAQ.",
        );

        let result = analyze_section(&ctx, &section).await;

        assert_eq!(result.subsections.len(), 1);
        assert_eq!(result.subsections[0].subsection_name, "full_section");
    }

    #[test]
    fn test_resolve_sentiment_prefers_llm_value() {
        assert_eq!(resolve_sentiment(Some(0.6), &[]), 0.6);
        assert_eq!(resolve_sentiment(Some(-0.4), &[]), -0.4);
    }

    #[test]
    fn test_resolve_sentiment_falls_back_to_heuristic() {
        let results = vec![SubsectionResult {
            subsection_name: "risks".to_string(),
            schema_type_name: "Risks".to_string(),
            analysis: SubsectionAnalysis::Generic {
                record: serde_json::json!({
                    "summary": "Impairment charges and litigation drove the decline in results, \
                                with continued uncertainty around restructuring."
                }),
            },
            parent_section: "Item 1A".to_string(),
            focus_note: "risks".to_string(),
            processing_time: 0.1,
        }];

        // Out-of-range LLM sentiment is discarded for the keyword score.
        let sentiment = resolve_sentiment(Some(3.0), &results);
        assert!(sentiment < 0.0);

        let missing = resolve_sentiment(None, &results);
        assert!(missing < 0.0);
    }
}
