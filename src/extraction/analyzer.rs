//! Structured subsection analysis.
//!
//! Each subsection excerpt is analyzed with one schema-constrained
//! completion. The response must validate against the subsection's declared
//! fields; invalid responses are transient and retried by the coordinator.
//! After retries are exhausted the result degrades to a failure record and
//! never propagates an error.

use crate::context::RunContext;
use crate::coordinator::{ServiceError, ServiceKind};
use crate::models::{SubsectionAnalysis, SubsectionResult};
use crate::provider::CompletionRequest;
use crate::schema::{FieldSpec, RecordSchema, SubsectionSchema};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

const ANALYSIS_SYSTEM_PROMPT: &str = "You are a financial filing analyst. \
Analyze the provided filing excerpt and respond with the requested JSON \
object. Be specific: cite figures, named entities, and disclosed facts.";

/// Envelope fields present in every analysis record alongside the
/// subsection's declared fields.
const ENVELOPE_FIELDS: &[(&str, &str)] = &[
    ("summary", "Concise summary of the analyzed excerpt"),
    ("key_findings", "Most important findings, ordered by materiality"),
    ("sentiment", "Sentiment of the excerpt from -1.0 to 1.0"),
];

/// Analyzes one subsection excerpt into a validated [`SubsectionResult`].
///
/// `processing_time` is measured wall-clock around the coordinated call.
pub async fn analyze_subsection(
    ctx: &RunContext,
    excerpt: &str,
    subsection: &SubsectionSchema,
    section_name: &str,
) -> SubsectionResult {
    let started = Instant::now();
    let schema = analysis_schema(&subsection.fields);
    let prompt = build_analysis_prompt(ctx, excerpt, &subsection.name, &subsection.fields, section_name);

    let outcome = run_structured(ctx, prompt, schema, &subsection.fields).await;
    let processing_time = started.elapsed().as_secs_f64();

    match outcome {
        Ok(record) => {
            debug!(
                section = section_name,
                subsection = %subsection.name,
                "subsection analysis complete"
            );
            SubsectionResult {
                subsection_name: subsection.name.clone(),
                schema_type_name: subsection.type_name.clone(),
                analysis: SubsectionAnalysis::Structured {
                    schema: subsection.type_name.clone(),
                    record,
                },
                parent_section: section_name.to_string(),
                focus_note: format!("Focused on {} within {}", subsection.name, section_name),
                processing_time,
            }
        }
        Err(err) => {
            warn!(
                section = section_name,
                subsection = %subsection.name,
                error = %err,
                "subsection analysis degraded"
            );
            SubsectionResult::failed(
                subsection.name.clone(),
                subsection.type_name.clone(),
                section_name,
                err.to_string(),
                processing_time,
            )
        }
    }
}

/// Whole-section analysis used when a section declares no subsections.
///
/// Produces a single generic result for the section; degrades the same way
/// as per-subsection analysis.
pub async fn analyze_whole_section(
    ctx: &RunContext,
    section_text: &str,
    record_schema: &RecordSchema,
    section_name: &str,
) -> SubsectionResult {
    let started = Instant::now();
    let schema = analysis_schema(&record_schema.fields);
    let prompt = build_analysis_prompt(
        ctx,
        section_text,
        "full_section",
        &record_schema.fields,
        section_name,
    );

    let outcome = run_structured(ctx, prompt, schema, &record_schema.fields).await;
    let processing_time = started.elapsed().as_secs_f64();

    match outcome {
        Ok(record) => SubsectionResult {
            subsection_name: "full_section".to_string(),
            schema_type_name: record_schema.type_name.to_string(),
            analysis: SubsectionAnalysis::Generic { record },
            parent_section: section_name.to_string(),
            focus_note: format!("Whole-section analysis of {}", section_name),
            processing_time,
        },
        Err(err) => SubsectionResult::failed(
            "full_section",
            record_schema.type_name,
            section_name,
            err.to_string(),
            processing_time,
        ),
    }
}

/// Runs the structured completion through the coordinator, validating the
/// response inside the retried operation so malformed records are retried.
async fn run_structured(
    ctx: &RunContext,
    prompt: String,
    schema: Value,
    fields: &[FieldSpec],
) -> Result<Value, ServiceError> {
    let request = CompletionRequest::new(ANALYSIS_SYSTEM_PROMPT, prompt);
    let provider = Arc::clone(&ctx.provider);
    let field_names: Vec<String> = fields.iter().map(|f| f.name.to_string()).collect();

    ctx.coordinator
        .execute(ServiceKind::Llm, || {
            let provider = Arc::clone(&provider);
            let request = request.clone();
            let schema = schema.clone();
            let field_names = field_names.clone();
            async move {
                let record = provider.complete_structured(request, schema).await?;
                validate_record(record, &field_names)
            }
        })
        .await
}

/// Checks the response is an object carrying every declared field.
fn validate_record(record: Value, field_names: &[String]) -> Result<Value, ServiceError> {
    let object = record
        .as_object()
        .ok_or_else(|| ServiceError::transient("structured response is not a JSON object"))?;

    for name in field_names {
        if !object.contains_key(name) {
            return Err(ServiceError::transient(format!(
                "structured response missing field '{}'",
                name
            )));
        }
    }

    Ok(record)
}

/// Builds the JSON schema for an analysis record: the declared fields plus
/// the shared envelope.
pub fn analysis_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for field in fields {
        properties.insert(
            field.name.to_string(),
            json!({"type": "string", "description": field.description}),
        );
        required.push(Value::String(field.name.to_string()));
    }

    for (name, description) in ENVELOPE_FIELDS {
        if properties.contains_key(*name) {
            continue;
        }
        let property = match *name {
            "key_findings" => json!({
                "type": "array",
                "items": {"type": "string"},
                "description": description,
            }),
            "sentiment" => json!({"type": "number", "description": description}),
            _ => json!({"type": "string", "description": description}),
        };
        properties.insert(name.to_string(), property);
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn build_analysis_prompt(
    ctx: &RunContext,
    excerpt: &str,
    subsection_name: &str,
    fields: &[FieldSpec],
    section_name: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Company: {}\nFiling type: {}\nSection: {}\nSubsection: {}\n\n",
        ctx.company_name, ctx.filing_type, section_name, subsection_name
    ));

    prompt.push_str("Fill in each field from the excerpt:\n");
    for field in fields {
        prompt.push_str(&format!("- {}: {}\n", field.name, field.description));
    }

    prompt.push_str("\n=== EXCERPT ===\n");
    prompt.push_str(ctx.clip_for_prompt(excerpt));
    prompt.push_str("\n=== END EXCERPT ===\n");

    prompt
}
