//! 提示词构建
//!
//! 生成的文档是英文的，所以提示词也用英文。

use crate::models::CitationStyle;
use crate::services::bibliography::MAX_SOURCES;

pub const WORKSHEET_SYSTEM: &str =
    "You complete school worksheets accurately and return clean markdown only.";
pub const ESSAY_SYSTEM: &str =
    "You are an academic writer. You follow word budgets and formatting instructions exactly.";

/// 完成作业的提示词
pub fn worksheet_prompt(text: &str, style: CitationStyle, topic_hint: &str) -> String {
    let hint = if topic_hint.trim().is_empty() {
        "none"
    } else {
        topic_hint.trim()
    };
    format!(
        r#"Complete this assignment perfectly in {style} style. Topic hint: {hint}.
Answer every question in the order it appears in the document.

Document:
"""{text}"""

Return ONLY clean markdown with headings, bullets, and a {heading} section at the end."#,
        style = style.name(),
        hint = hint,
        text = text,
        heading = style.bibliography_heading(),
    )
}

/// 大纲 + 来源计划的提示词（要求 JSON 回复）
pub fn outline_prompt(text: &str, style: CitationStyle, target_words: usize) -> String {
    format!(
        r#"Plan a {target}-word academic essay in {style} style based on the worksheet below.

Worksheet:
"""{text}"""

Respond with ONLY a JSON object of this shape:
{{
  "title": "essay title",
  "outline": ["Introduction", "...", "Conclusion"],
  "sources": [
    {{"author": "Last, First", "title": "...", "journal": "...", "year": "2020",
      "volume": "", "issue": "", "pages": "", "doi": "https://doi.org/..."}}
  ]
}}
The outline must contain {sections} section headings. Provide exactly {sources} real, relevant scholarly sources."#,
        target = target_words,
        style = style.name(),
        text = text,
        sections = suggested_section_count(target_words),
        sources = MAX_SOURCES,
    )
}

/// 单个章节的提示词
pub fn section_prompt(
    title: &str,
    heading: &str,
    budget: usize,
    worksheet: &str,
    bibliography: &str,
    style: CitationStyle,
) -> String {
    format!(
        r#"You are writing the section "{heading}" of the essay "{title}".
Write about {budget} words of formal academic prose in {style} style with in-text citations drawn from the sources below.
Do NOT repeat the section heading, do NOT add a title, and do NOT include a reference list.

Worksheet:
"""{worksheet}"""

Sources:
{bibliography}

Return ONLY the section body as markdown paragraphs."#,
        heading = heading,
        title = title,
        budget = budget,
        style = style.name(),
        worksheet = worksheet,
        bibliography = bibliography,
    )
}

/// 建议的章节数：约每 350 词一节，另加引言，限制在 4..=14
pub fn suggested_section_count(target_words: usize) -> usize {
    (target_words.div_ceil(350) + 1).clamp(4, 14)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worksheet_prompt_defaults_hint() {
        let prompt = worksheet_prompt("Q1. Why?", CitationStyle::Apa, "  ");
        assert!(prompt.contains("Topic hint: none."));
        assert!(prompt.contains("in APA style"));
        assert!(prompt.contains("References section"));
    }

    #[test]
    fn test_outline_prompt_mentions_budget_and_sources() {
        let prompt = outline_prompt("text", CitationStyle::Mla, 1500);
        assert!(prompt.contains("1500-word"));
        assert!(prompt.contains("exactly 8 real"));
        assert!(prompt.contains("\"outline\""));
    }

    #[test]
    fn test_section_prompt_carries_inputs() {
        let prompt = section_prompt("T", "Background", 650, "WS", "## Works Cited", CitationStyle::Mla);
        assert!(prompt.contains("\"Background\""));
        assert!(prompt.contains("about 650 words"));
        assert!(prompt.contains("WS"));
        assert!(prompt.contains("## Works Cited"));
    }

    #[test]
    fn test_suggested_section_count() {
        assert_eq!(suggested_section_count(800), 4);
        assert_eq!(suggested_section_count(1500), 6);
        assert_eq!(suggested_section_count(7000), 14);
    }
}
