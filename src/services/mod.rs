pub mod bibliography;
pub mod docx_renderer;
pub mod llm_service;
pub mod markdown_parser;
pub mod word_counter;

pub use bibliography::{format_bibliography, BibliographyBlock};
pub use docx_renderer::render_markdown;
pub use llm_service::{LlmService, TextProvider};
pub use markdown_parser::MarkdownParser;
pub use word_counter::count_words;
