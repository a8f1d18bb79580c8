//! Concurrent subsection fan-out.
//!
//! Launches one task per discovered subsection, each running extraction and
//! analysis against the shared coordinator. Tasks are isolated: one task's
//! failure degrades its own slot and never cancels siblings. The returned
//! list is re-associated to schema declaration order after the join, so
//! completion order never leaks into result order.

use crate::context::RunContext;
use crate::extraction::{analyze_subsection, analyze_whole_section, extract_excerpt};
use crate::models::{Section, SubsectionResult};
use crate::schema::{generic_section_record, SubsectionSchema};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Analyzes every subsection of a section concurrently.
///
/// Returns one result per subsection in declaration order. With an empty
/// subsection list, falls back to exactly one whole-section analysis.
pub async fn analyze_section_subsections(
    ctx: &Arc<RunContext>,
    section: &Section,
    subsections: Vec<SubsectionSchema>,
) -> Vec<SubsectionResult> {
    if subsections.is_empty() {
        debug!(
            section = %section.name,
            "no subsections discovered; running whole-section analysis"
        );
        let generic = generic_section_record();
        return vec![analyze_whole_section(ctx, &section.text, &generic, &section.name).await];
    }

    let section_text: Arc<str> = Arc::from(section.text.as_str());
    let section_name: Arc<str> = Arc::from(section.name.as_str());

    // Labels survive the spawn so a panicked task can still fill its slot.
    let labels: Vec<(String, String)> = subsections
        .iter()
        .map(|s| (s.name.clone(), s.type_name.clone()))
        .collect();

    let handles: Vec<_> = subsections
        .into_iter()
        .enumerate()
        .map(|(index, subsection)| {
            let ctx = Arc::clone(ctx);
            let text = Arc::clone(&section_text);
            let name = Arc::clone(&section_name);

            tokio::spawn(async move {
                let excerpt = extract_excerpt(&ctx, &text, &subsection, &name).await;
                let result = analyze_subsection(&ctx, &excerpt, &subsection, &name).await;
                (index, result)
            })
        })
        .collect();

    let joined = join_all(handles).await;

    // Re-associate results to declaration order after the join.
    let mut ordered: Vec<Option<SubsectionResult>> = Vec::new();
    ordered.resize_with(labels.len(), || None);

    for (slot, outcome) in joined.into_iter().enumerate() {
        match outcome {
            Ok((index, result)) => ordered[index] = Some(result),
            Err(join_error) => {
                let (name, type_name) = &labels[slot];
                warn!(
                    section = %section.name,
                    subsection = %name,
                    "subsection task aborted: {join_error}"
                );
                ordered[slot] = Some(SubsectionResult::failed(
                    name.clone(),
                    type_name.clone(),
                    section.name.clone(),
                    format!("task aborted: {join_error}"),
                    0.0,
                ));
            }
        }
    }

    ordered
        .into_iter()
        .enumerate()
        .map(|(slot, result)| {
            result.unwrap_or_else(|| {
                let (name, type_name) = &labels[slot];
                SubsectionResult::failed(
                    name.clone(),
                    type_name.clone(),
                    section.name.clone(),
                    "task produced no result",
                    0.0,
                )
            })
        })
        .collect()
}
