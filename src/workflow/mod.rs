pub mod compose_ctx;
pub mod essay_flow;
pub mod prompts;
pub mod worksheet_flow;

pub use compose_ctx::{parse_target_words, ComposeCtx};
pub use essay_flow::{EssayDraft, EssayFlow, SectionDraft};
pub use worksheet_flow::WorksheetFlow;
