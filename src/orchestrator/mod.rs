//! Concurrent analysis orchestration.
//!
//! Three layers, bottom-up: subsection fan-out, section summarization, and
//! the filing-level pipeline behind [`FilingAnalyzer`].

pub mod filing;
pub mod section;
pub mod subsection;

pub use filing::FilingAnalyzer;
pub use section::analyze_section;
pub use subsection::analyze_section_subsections;
