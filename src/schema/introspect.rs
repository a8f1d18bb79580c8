//! Subsection discovery over section schemas.
//!
//! Walks a section's declared fields, unwraps optional and list wrappers,
//! and keeps every field whose underlying kind is a structured record.
//! Enumerations and scalars are not subsections; union fields are skipped
//! with a diagnostic rather than silently dropped.

use crate::schema::registry::{FieldKind, FieldSpec, RecordSchema, SectionSchema};
use tracing::warn;

/// A discovered subsection: a named record the section decomposes into.
#[derive(Debug, Clone)]
pub struct SubsectionSchema {
    /// Subsection name (the declaring field's name).
    pub name: String,
    /// Record type name, used for labeling and validation.
    pub type_name: String,
    /// Ordered fields with prompt-ready descriptions.
    pub fields: Vec<FieldSpec>,
}

impl SubsectionSchema {
    /// Builds a subsection schema from a record declaration.
    pub fn from_record(name: &str, record: &RecordSchema) -> Self {
        Self {
            name: name.to_string(),
            type_name: record.type_name.to_string(),
            fields: record.fields.clone(),
        }
    }
}

enum Unwrapped<'a> {
    Record(&'a RecordSchema),
    NotARecord,
    Ambiguous(usize),
}

/// Discovers the ordered subsections a section schema declares.
///
/// Deterministic and idempotent: the output order is the declaration order,
/// and repeated runs over the same schema yield the same list. An empty
/// result is valid and signals whole-section fallback analysis.
pub fn discover_subsections(schema: &SectionSchema) -> Vec<SubsectionSchema> {
    let mut subsections = Vec::new();

    for field in &schema.fields {
        match unwrap_kind(&field.kind) {
            Unwrapped::Record(record) => {
                subsections.push(SubsectionSchema::from_record(field.name, record));
            }
            Unwrapped::Ambiguous(variant_count) => {
                warn!(
                    section = schema.name,
                    field = field.name,
                    variant_count,
                    "skipped structurally ambiguous field during subsection discovery"
                );
            }
            Unwrapped::NotARecord => {}
        }
    }

    subsections
}

/// Peels optional and list wrappers off a field kind.
fn unwrap_kind(kind: &FieldKind) -> Unwrapped<'_> {
    match kind {
        FieldKind::Record(record) => Unwrapped::Record(record),
        FieldKind::Optional(inner) | FieldKind::List(inner) => unwrap_kind(inner),
        FieldKind::Union(variants) => Unwrapped::Ambiguous(variants.len()),
        FieldKind::Enumeration(_) | FieldKind::Scalar(_) => Unwrapped::NotARecord,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::registry::{
        business_schema, financial_statements_schema, mdna_schema, risk_factors_schema,
        SectionField,
    };

    #[test]
    fn test_business_discovery_order_and_wrappers() {
        let subsections = discover_subsections(&business_schema());
        let names: Vec<&str> = subsections.iter().map(|s| s.name.as_str()).collect();

        // growth_strategy is Optional-wrapped and human_capital List-wrapped;
        // both unwrap to records. Enumeration and scalar fields are skipped.
        assert_eq!(
            names,
            vec![
                "business_overview",
                "competitive_landscape",
                "growth_strategy",
                "human_capital"
            ]
        );
        assert_eq!(subsections[0].type_name, "BusinessOverview");
    }

    #[test]
    fn test_union_field_is_skipped() {
        let subsections = discover_subsections(&risk_factors_schema());
        let names: Vec<&str> = subsections.iter().map(|s| s.name.as_str()).collect();

        assert!(names.contains(&"operational_risks"));
        assert!(!names.contains(&"emerging_risks"));
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let schema = mdna_schema();
        let first: Vec<String> = discover_subsections(&schema)
            .into_iter()
            .map(|s| s.name)
            .collect();
        let second: Vec<String> = discover_subsections(&schema)
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_empty_schema_is_valid() {
        let schema = SectionSchema {
            name: "Exhibits",
            fields: vec![],
        };
        assert!(discover_subsections(&schema).is_empty());
    }

    #[test]
    fn test_scalar_only_schema_discovers_nothing() {
        let schema = SectionSchema {
            name: "Cover",
            fields: vec![
                SectionField {
                    name: "fiscal_year",
                    kind: FieldKind::Scalar("string"),
                },
                SectionField {
                    name: "filer_status",
                    kind: FieldKind::Enumeration("FilerStatus"),
                },
            ],
        };
        assert!(discover_subsections(&schema).is_empty());
    }

    #[test]
    fn test_nested_wrapper_unwraps_to_record() {
        let subsections = discover_subsections(&financial_statements_schema());
        assert!(subsections.iter().any(|s| s.name == "footnote_highlights"));
    }
}
