//! Section schemas and subsection discovery.

pub mod introspect;
pub mod registry;

pub use introspect::{discover_subsections, SubsectionSchema};
pub use registry::{
    generic_section_record, schema_for_section, FieldKind, FieldSpec, RecordSchema, SectionField,
    SectionSchema,
};
