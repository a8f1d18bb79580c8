//! Excerpt extraction for subsection analysis.
//!
//! Before a subsection is analyzed, the relevant passage is pulled out of
//! the full section text with one unstructured completion. Extraction is
//! best-effort: any failure falls back to the full section text so the
//! downstream analysis always has input.

use crate::context::RunContext;
use crate::coordinator::ServiceKind;
use crate::provider::CompletionRequest;
use crate::schema::SubsectionSchema;
use std::sync::Arc;
use tracing::{debug, warn};

const EXTRACTION_SYSTEM_PROMPT: &str = "You are a financial filing analyst. \
Extract the passage of the provided section that is relevant to the requested \
topic. Return only the extracted text, with no commentary.";

/// Pulls the excerpt relevant to `subsection` out of the section text.
///
/// Makes exactly one coordinated call. On any failure, or when the model
/// returns nothing usable, the full section text is returned instead; this
/// function never fails.
pub async fn extract_excerpt(
    ctx: &RunContext,
    section_text: &str,
    subsection: &SubsectionSchema,
    section_name: &str,
) -> String {
    let prompt = build_extraction_prompt(ctx, section_text, subsection, section_name);
    let request = CompletionRequest::new(EXTRACTION_SYSTEM_PROMPT, prompt);

    let provider = Arc::clone(&ctx.provider);
    let outcome = ctx
        .coordinator
        .execute(ServiceKind::Llm, || {
            let provider = Arc::clone(&provider);
            let request = request.clone();
            async move { provider.complete(request).await }
        })
        .await;

    match outcome {
        Ok(excerpt) if !excerpt.trim().is_empty() => excerpt,
        Ok(_) => {
            debug!(
                section = section_name,
                subsection = %subsection.name,
                "empty excerpt; using full section text"
            );
            section_text.to_string()
        }
        Err(err) => {
            warn!(
                section = section_name,
                subsection = %subsection.name,
                error = %err,
                "excerpt extraction failed; using full section text"
            );
            section_text.to_string()
        }
    }
}

fn build_extraction_prompt(
    ctx: &RunContext,
    section_text: &str,
    subsection: &SubsectionSchema,
    section_name: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Company: {}\nFiling section: {}\nTopic: {}\n\n",
        ctx.company_name, section_name, subsection.name
    ));

    prompt.push_str("The topic covers:\n");
    for field in &subsection.fields {
        prompt.push_str(&format!("- {}: {}\n", field.name, field.description));
    }

    prompt.push_str("\n=== SECTION TEXT ===\n");
    prompt.push_str(ctx.clip_for_prompt(section_text));
    prompt.push_str("\n=== END SECTION TEXT ===\n\n");
    prompt.push_str("Extract the passage relevant to the topic above.");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context, test_context_shared, FailEvery, MockProvider};

    fn subsection() -> SubsectionSchema {
        SubsectionSchema {
            name: "competitive_landscape".to_string(),
            type_name: "CompetitiveLandscape".to_string(),
            fields: vec![],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_extraction_returns_excerpt() {
        let provider = Arc::new(MockProvider::new().with_completion("the relevant passage"));
        let ctx = test_context_shared(Arc::clone(&provider));

        let excerpt =
            extract_excerpt(&ctx, "full section text", &subsection(), "Item 1. Business").await;
        assert_eq!(excerpt, "the relevant passage");

        // Extraction makes exactly one coordinated call.
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_falls_back_to_full_text() {
        let ctx = test_context(MockProvider::new().with_failures(FailEvery::Always));

        let excerpt =
            extract_excerpt(&ctx, "full section text", &subsection(), "Item 1. Business").await;
        assert_eq!(excerpt, "full section text");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_response_falls_back_to_full_text() {
        let ctx = test_context(MockProvider::new().with_completion("   \n"));

        let excerpt =
            extract_excerpt(&ctx, "full section text", &subsection(), "Item 1. Business").await;
        assert_eq!(excerpt, "full section text");
    }
}
