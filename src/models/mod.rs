pub mod citation_style;
pub mod document;
pub mod generation;
pub mod plan;
pub mod source;

pub use citation_style::CitationStyle;
pub use document::{HeadingEcho, Run, StructuralNode};
pub use generation::{GenerationRequest, Stage};
pub use plan::{OutlinePlan, PlanOutcome, RawPlan};
pub use source::{RawSourceRecord, SourceRecord};
