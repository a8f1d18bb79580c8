//! Filing-level orchestration and overall summarization.
//!
//! [`FilingAnalyzer`] is the public entry point: it fans section analysis
//! out over every non-blank section, re-associates results to input order,
//! and aggregates them into the [`FilingResult`] with one overall
//! summarization call under the same retry/fallback discipline as the
//! section level.

use crate::config::Config;
use crate::context::RunContext;
use crate::coordinator::{
    HealthSnapshot, ServiceCoordinator, ServiceError, ServiceKind,
};
use crate::models::{AnalysisTotals, FilingResult, Section, SectionResult};
use crate::orchestrator::section::analyze_section;
use crate::provider::{CompletionProvider, CompletionRequest, OllamaConfig, OllamaProvider};
use chrono::Utc;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

const OVERALL_SUMMARY_SYSTEM_PROMPT: &str = "You are a financial filing analyst. \
Aggregate the provided section summaries into one filing-level assessment. \
Respond with the requested JSON object.";

/// The structured record the overall summarization call must produce.
#[derive(Debug, Deserialize)]
struct FilingSummaryRecord {
    filing_summary: String,
    executive_summary: String,
    #[serde(default)]
    key_insights: Vec<String>,
    #[serde(default)]
    financial_highlights: Vec<String>,
    #[serde(default)]
    risk_factors: Vec<String>,
    #[serde(default)]
    opportunities: Vec<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn overall_summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "filing_summary": {
                "type": "string",
                "description": "Narrative summary of the whole filing"
            },
            "executive_summary": {
                "type": "string",
                "description": "Short executive summary"
            },
            "key_insights": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Cross-section insights"
            },
            "financial_highlights": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Notable financial data points"
            },
            "risk_factors": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Aggregated risks"
            },
            "opportunities": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Aggregated opportunities"
            },
            "confidence": {
                "type": "number",
                "description": "Confidence in the analysis from 0.0 to 1.0"
            }
        },
        "required": ["filing_summary", "executive_summary"]
    })
}

/// The filing analysis pipeline.
///
/// Owns the service coordinator and the completion provider; one instance
/// can analyze any number of filings, with rate-limit windows and health
/// counters carrying across runs.
pub struct FilingAnalyzer {
    coordinator: Arc<ServiceCoordinator>,
    provider: Arc<dyn CompletionProvider>,
    config: Config,
}

impl FilingAnalyzer {
    /// Creates an analyzer with a coordinator built from the config limits.
    pub fn new(config: Config, provider: Arc<dyn CompletionProvider>) -> Self {
        let coordinator = Arc::new(ServiceCoordinator::new(
            config.limits.llm.to_service_limits(),
            config.limits.edgar.to_service_limits(),
        ));
        Self {
            coordinator,
            provider,
            config,
        }
    }

    /// Creates an analyzer backed by the bundled Ollama provider.
    pub fn from_config(config: Config) -> Self {
        let provider = Arc::new(OllamaProvider::new(OllamaConfig::from(&config.model)));
        Self::new(config, provider)
    }

    /// Health of both governed dependencies.
    pub fn health_report(&self) -> Vec<HealthSnapshot> {
        self.coordinator.health_report()
    }

    /// Analyzes a filing: one [`SectionResult`] per non-blank input section,
    /// in input order, plus the filing-level aggregation.
    ///
    /// Always returns a complete result graph; failures along the way reduce
    /// completeness and confidence instead of surfacing as errors.
    pub async fn analyze_filing(
        &self,
        company_name: &str,
        filing_type: &str,
        sections: Vec<Section>,
    ) -> FilingResult {
        let started = Instant::now();

        let ctx = Arc::new(RunContext {
            coordinator: Arc::clone(&self.coordinator),
            provider: Arc::clone(&self.provider),
            company_name: company_name.to_string(),
            filing_type: filing_type.to_string(),
            analysis: self.config.analysis.clone(),
        });

        let total = sections.len();
        let candidates: Vec<Section> = sections.into_iter().filter(|s| !s.is_blank()).collect();
        if candidates.len() < total {
            info!(
                company = company_name,
                skipped = total - candidates.len(),
                "skipping blank sections"
            );
        }
        info!(
            company = company_name,
            filing_type,
            sections = candidates.len(),
            "starting filing analysis"
        );

        let section_results = self.analyze_sections(&ctx, candidates).await;

        let result = match summarize_overall_with_retry(&ctx, &section_results).await {
            Ok(record) => {
                let confidence = record
                    .confidence
                    .filter(|c| (0.0..=1.0).contains(c))
                    .unwrap_or(ctx.analysis.fallback_confidence);
                build_result(
                    &ctx,
                    record.filing_summary,
                    record.executive_summary,
                    record.key_insights,
                    record.financial_highlights,
                    record.risk_factors,
                    record.opportunities,
                    confidence,
                    section_results,
                    started,
                )
            }
            Err(err) => {
                warn!(
                    company = company_name,
                    error = %err,
                    "overall summarization exhausted; returning partial result"
                );
                partial_result(&ctx, section_results, started)
            }
        };

        info!(
            company = company_name,
            sections = result.totals.section_count,
            subsections = result.totals.subsection_count,
            elapsed = result.totals.elapsed_seconds,
            "filing analysis complete"
        );

        result
    }

    /// Fans section analysis out and restores input order after the join.
    async fn analyze_sections(
        &self,
        ctx: &Arc<RunContext>,
        sections: Vec<Section>,
    ) -> Vec<SectionResult> {
        let labels: Vec<String> = sections.iter().map(|s| s.name.clone()).collect();

        let handles: Vec<_> = sections
            .into_iter()
            .enumerate()
            .map(|(index, section)| {
                let ctx = Arc::clone(ctx);
                tokio::spawn(async move { (index, analyze_section(&ctx, &section).await) })
            })
            .collect();

        let joined = join_all(handles).await;

        let mut ordered: Vec<Option<SectionResult>> = Vec::new();
        ordered.resize_with(labels.len(), || None);

        for (slot, outcome) in joined.into_iter().enumerate() {
            match outcome {
                Ok((index, result)) => ordered[index] = Some(result),
                Err(join_error) => {
                    warn!(
                        section = %labels[slot],
                        "section task aborted: {join_error}"
                    );
                    ordered[slot] =
                        Some(SectionResult::fallback(labels[slot].clone(), Vec::new(), 0.0));
                }
            }
        }

        ordered
            .into_iter()
            .enumerate()
            .map(|(slot, result)| {
                result.unwrap_or_else(|| {
                    SectionResult::fallback(labels[slot].clone(), Vec::new(), 0.0)
                })
            })
            .collect()
    }
}

#[allow(clippy::too_many_arguments)]
fn build_result(
    ctx: &RunContext,
    filing_summary: String,
    executive_summary: String,
    key_insights: Vec<String>,
    financial_highlights: Vec<String>,
    risk_factors: Vec<String>,
    opportunities: Vec<String>,
    confidence: f64,
    sections: Vec<SectionResult>,
    started: Instant,
) -> FilingResult {
    let elapsed = started.elapsed().as_secs_f64();
    FilingResult {
        filing_summary,
        executive_summary,
        key_insights,
        financial_highlights,
        risk_factors,
        opportunities,
        confidence,
        totals: AnalysisTotals::from_sections(&sections, elapsed),
        sections,
        filing_type: ctx.filing_type.clone(),
        company_name: ctx.company_name.clone(),
        timestamp: Utc::now(),
    }
}

/// Minimal filing result used when overall summarization is exhausted.
///
/// Carries every section result and salvages insights and critical findings
/// from them; the fixed fallback confidence marks the analysis as partial.
fn partial_result(
    ctx: &RunContext,
    sections: Vec<SectionResult>,
    started: Instant,
) -> FilingResult {
    let key_insights: Vec<String> = sections
        .iter()
        .flat_map(|s| s.insights.iter().cloned())
        .take(10)
        .collect();
    let risk_factors: Vec<String> = sections
        .iter()
        .flat_map(|s| s.critical_findings.iter().cloned())
        .take(10)
        .collect();

    build_result(
        ctx,
        format!(
            "Overall summarization unavailable for this {} filing; analysis is partial. \
             Section results are complete.",
            ctx.filing_type
        ),
        "Analysis is partial: see per-section summaries.".to_string(),
        key_insights,
        Vec::new(),
        risk_factors,
        Vec::new(),
        ctx.analysis.fallback_confidence,
        sections,
        started,
    )
}

/// Retries the overall summarization with the same backoff policy as the
/// section level.
async fn summarize_overall_with_retry(
    ctx: &Arc<RunContext>,
    sections: &[SectionResult],
) -> Result<FilingSummaryRecord, ServiceError> {
    let max_attempts = ctx.analysis.summary_max_attempts.max(1);
    let base_delay = ctx.analysis.summary_base_delay();
    let mut last_error = None;

    for attempt in 0..max_attempts {
        match summarize_overall_once(ctx, sections).await {
            Ok(record) => return Ok(record),
            Err(err) => {
                if attempt + 1 < max_attempts {
                    let delay = base_delay * 2u32.saturating_pow(attempt as u32);
                    warn!(
                        attempt,
                        error = %err,
                        "overall summarization failed; retrying in {:.1}s",
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

async fn summarize_overall_once(
    ctx: &Arc<RunContext>,
    sections: &[SectionResult],
) -> Result<FilingSummaryRecord, ServiceError> {
    let prompt = build_overall_prompt(ctx, sections);
    let request = CompletionRequest::new(OVERALL_SUMMARY_SYSTEM_PROMPT, prompt);
    let schema = overall_summary_schema();
    let provider = Arc::clone(&ctx.provider);

    ctx.coordinator
        .execute(ServiceKind::Llm, || {
            let provider = Arc::clone(&provider);
            let request = request.clone();
            let schema = schema.clone();
            async move {
                let value = provider.complete_structured(request, schema).await?;
                serde_json::from_value(value).map_err(|e| {
                    ServiceError::transient(format!("filing summary record invalid: {}", e))
                })
            }
        })
        .await
}

fn build_overall_prompt(ctx: &RunContext, sections: &[SectionResult]) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Aggregate the section summaries of the {} filing by {}.\n\n",
        ctx.filing_type, ctx.company_name
    ));

    for section in sections {
        prompt.push_str(&format!("## {}\n{}\n", section.section_name, section.summary_text));
        if !section.insights.is_empty() {
            prompt.push_str("Insights:\n");
            for insight in &section.insights {
                prompt.push_str(&format!("- {}\n", insight));
            }
        }
        if !section.critical_findings.is_empty() {
            prompt.push_str("Critical findings:\n");
            for finding in &section.critical_findings {
                prompt.push_str(&format!("- {}\n", finding));
            }
        }
        prompt.push('\n');
    }

    prompt.push_str("Produce the filing-level assessment from the summaries above.");
    prompt
}
