//! Data models for filing analysis.
//!
//! This module contains the core data structures used throughout the
//! pipeline for representing sections, subsection analyses, and the
//! aggregated filing-level result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, contiguous block of filing text handed in by the caller.
///
/// Sections whose text is empty or whitespace-only are skipped by the
/// filing orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Section name as it appears in the filing (e.g. "Item 1A. Risk Factors").
    pub name: String,
    /// Full section text.
    pub text: String,
}

impl Section {
    /// Creates a new section.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Returns true if the section carries no analyzable text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The analysis payload of a single subsection.
///
/// Exactly one of these shapes is produced per subsection task:
/// a record validated against the subsection's declared schema, a generic
/// whole-section record when no subsections were discovered, or a failure
/// marker carrying the reason the analysis degraded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubsectionAnalysis {
    /// Schema-validated structured analysis.
    Structured {
        /// Name of the schema the record was validated against.
        schema: String,
        /// The validated analysis record.
        record: serde_json::Value,
    },
    /// Whole-section analysis produced when a section declares no subsections.
    Generic {
        /// The analysis record.
        record: serde_json::Value,
    },
    /// The analysis could not be produced; siblings are unaffected.
    Failed {
        /// Why the analysis degraded.
        reason: String,
    },
}

impl SubsectionAnalysis {
    /// Returns true if this analysis carries no usable record.
    pub fn is_empty(&self) -> bool {
        matches!(self, SubsectionAnalysis::Failed { .. })
    }
}

impl fmt::Display for SubsectionAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubsectionAnalysis::Structured { schema, .. } => write!(f, "structured({})", schema),
            SubsectionAnalysis::Generic { .. } => write!(f, "generic"),
            SubsectionAnalysis::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Result of analyzing one subsection of a filing section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsectionResult {
    /// Subsection name from the schema registry (e.g. "competitive_landscape").
    pub subsection_name: String,
    /// Type name of the schema the subsection was analyzed against.
    pub schema_type_name: String,
    /// The analysis payload.
    pub analysis: SubsectionAnalysis,
    /// Name of the section this subsection belongs to.
    pub parent_section: String,
    /// What the analysis focused on, or an "Analysis failed: ..." note.
    pub focus_note: String,
    /// Wall-clock seconds spent on this subsection.
    pub processing_time: f64,
}

impl SubsectionResult {
    /// Creates a degraded result for a subsection whose analysis failed.
    ///
    /// Keeps the invariant that the analysis is empty iff the focus note
    /// encodes a failure reason.
    pub fn failed(
        subsection_name: impl Into<String>,
        schema_type_name: impl Into<String>,
        parent_section: impl Into<String>,
        reason: impl Into<String>,
        processing_time: f64,
    ) -> Self {
        let reason = reason.into();
        Self {
            subsection_name: subsection_name.into(),
            schema_type_name: schema_type_name.into(),
            analysis: SubsectionAnalysis::Failed {
                reason: reason.clone(),
            },
            parent_section: parent_section.into(),
            focus_note: format!("Analysis failed: {}", reason),
            processing_time,
        }
    }

    /// Returns true if this subsection produced a usable analysis.
    pub fn succeeded(&self) -> bool {
        !self.analysis.is_empty()
    }
}

/// Aggregated result for one filing section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionResult {
    /// Section name as handed in by the caller.
    pub section_name: String,
    /// Narrative summary of the section.
    pub summary_text: String,
    /// Ordered list of insights extracted from the section.
    pub insights: Vec<String>,
    /// Section sentiment in [-1.0, 1.0].
    pub sentiment: f64,
    /// Findings that warrant attention (litigation, impairments, ...).
    pub critical_findings: Vec<String>,
    /// Subsection results in schema declaration order. Always carries one
    /// entry per launched task, even when summarization itself failed.
    pub subsections: Vec<SubsectionResult>,
    /// Wall-clock seconds spent on this section.
    pub processing_time: f64,
}

impl SectionResult {
    /// Creates the minimal fallback result used when summarization is
    /// exhausted. Already-computed subsection results are always retained.
    pub fn fallback(
        section_name: impl Into<String>,
        subsections: Vec<SubsectionResult>,
        processing_time: f64,
    ) -> Self {
        let section_name = section_name.into();
        Self {
            summary_text: format!(
                "Summary unavailable for {}; see subsection results.",
                section_name
            ),
            section_name,
            insights: Vec::new(),
            sentiment: 0.0,
            critical_findings: Vec::new(),
            subsections,
            processing_time,
        }
    }

    /// Number of subsections that produced a usable analysis.
    pub fn successful_subsections(&self) -> usize {
        self.subsections.iter().filter(|s| s.succeeded()).count()
    }
}

/// Counts and timings across the whole pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisTotals {
    /// Number of sections analyzed (blank sections excluded).
    pub section_count: usize,
    /// Total subsection tasks launched across all sections.
    pub subsection_count: usize,
    /// Wall-clock seconds for the full pipeline.
    pub elapsed_seconds: f64,
}

impl AnalysisTotals {
    /// Computes totals from the final section list.
    pub fn from_sections(sections: &[SectionResult], elapsed_seconds: f64) -> Self {
        Self {
            section_count: sections.len(),
            subsection_count: sections.iter().map(|s| s.subsections.len()).sum(),
            elapsed_seconds,
        }
    }
}

/// The complete filing-level analysis result.
///
/// Built bottom-up from section results; immutable once returned. Failure
/// anywhere in the pipeline manifests as reduced completeness or confidence,
/// never as a missing graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingResult {
    /// Narrative summary of the whole filing.
    pub filing_summary: String,
    /// Executive summary suitable for a report header.
    pub executive_summary: String,
    /// Cross-section insights.
    pub key_insights: Vec<String>,
    /// Notable financial data points.
    pub financial_highlights: Vec<String>,
    /// Aggregated risk factors.
    pub risk_factors: Vec<String>,
    /// Aggregated opportunities.
    pub opportunities: Vec<String>,
    /// Confidence in the overall analysis, in [0.0, 1.0].
    pub confidence: f64,
    /// Section results in input order.
    pub sections: Vec<SectionResult>,
    /// Counts and timings for the run.
    pub totals: AnalysisTotals,
    /// Filing type (e.g. "10-K").
    pub filing_type: String,
    /// Company the filing belongs to.
    pub company_name: String,
    /// When the analysis completed.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_is_blank() {
        assert!(Section::new("Item 1", "").is_blank());
        assert!(Section::new("Item 1", "  \n\t ").is_blank());
        assert!(!Section::new("Item 1", "Revenue grew.").is_blank());
    }

    #[test]
    fn test_failed_subsection_invariant() {
        let result = SubsectionResult::failed(
            "competitive_landscape",
            "CompetitiveLandscape",
            "Item 1. Business",
            "structured completion timed out",
            1.5,
        );

        assert!(result.analysis.is_empty());
        assert!(!result.succeeded());
        assert_eq!(
            result.focus_note,
            "Analysis failed: structured completion timed out"
        );
    }

    #[test]
    fn test_structured_analysis_not_empty() {
        let analysis = SubsectionAnalysis::Structured {
            schema: "RevenueBreakdown".to_string(),
            record: serde_json::json!({"summary": "Revenue up 12%"}),
        };
        assert!(!analysis.is_empty());
        assert_eq!(analysis.to_string(), "structured(RevenueBreakdown)");
    }

    #[test]
    fn test_section_fallback_keeps_subsections() {
        let subsections = vec![
            SubsectionResult::failed("a", "A", "Item 7", "timeout", 0.1),
            SubsectionResult {
                subsection_name: "b".to_string(),
                schema_type_name: "B".to_string(),
                analysis: SubsectionAnalysis::Generic {
                    record: serde_json::json!({}),
                },
                parent_section: "Item 7".to_string(),
                focus_note: "liquidity".to_string(),
                processing_time: 0.2,
            },
        ];

        let fallback = SectionResult::fallback("Item 7", subsections, 2.0);
        assert_eq!(fallback.subsections.len(), 2);
        assert_eq!(fallback.sentiment, 0.0);
        assert!(fallback.insights.is_empty());
        assert_eq!(fallback.successful_subsections(), 1);
    }

    #[test]
    fn test_totals_from_sections() {
        let sections = vec![
            SectionResult::fallback("Item 1", vec![], 1.0),
            SectionResult::fallback(
                "Item 7",
                vec![SubsectionResult::failed("a", "A", "Item 7", "x", 0.1)],
                1.0,
            ),
        ];

        let totals = AnalysisTotals::from_sections(&sections, 3.5);
        assert_eq!(totals.section_count, 2);
        assert_eq!(totals.subsection_count, 1);
        assert_eq!(totals.elapsed_seconds, 3.5);
    }

    #[test]
    fn test_subsection_analysis_serializes_tagged() {
        let failed = SubsectionAnalysis::Failed {
            reason: "boom".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["kind"], "failed");
        assert_eq!(json["reason"], "boom");
    }
}
