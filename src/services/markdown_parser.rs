//! Markdown 结构解析 - 业务能力层
//!
//! 只认识一组固定的标记，逐行把文本转换为 [`StructuralNode`] 序列。
//!
//! 判定顺序（每行先去掉首尾空白）：
//! 1. 空行 → `BlankLine`
//! 2. 第一行非空内容以 `# ` 开头 → `Title`（一次性，之后的 `# ` 行按普通段落处理，保留标记）
//! 3. `## ` → `Heading(2)`，并记为"当前标题"
//! 4. `### ` → `Heading(3)`
//! 5. 紧跟二级标题、与其文字完全相同的一行 → 丢弃
//! 6. 含超链接 → 拆分为纯文本 / 超链接 run 的 `Paragraph`（列表标记保留为文字）；
//!    否则列表标记 → `ListItem`，其余 → `Paragraph`
//!
//! 标题之前的空行会被丢弃。任何输入都不会导致解析失败：LLM 的输出没有结构保证，无法识别的内容一律降级为普通段落。

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{HeadingEcho, Run, StructuralNode};

const TITLE_MARKER: &str = "# ";
const HEADING2_MARKER: &str = "## ";
const HEADING3_MARKER: &str = "### ";
const BULLET_MARKERS: [&str; 4] = ["- ", "• ", "* ", "+ "];

fn numbered_pattern() -> &'static Regex {
    static NUMBERED: OnceLock<Regex> = OnceLock::new();
    NUMBERED.get_or_init(|| Regex::new(r"^\d+[.)]\s").expect("valid numbered-list regex"))
}

/// `[label](url)` 或裸露的 `http(s)://…` / `doi.org/…`
fn link_pattern() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| {
        Regex::new(
            r#"\[(?P<label>[^\]]+)\]\((?P<target>(?:https?://|doi\.org/)[^)\s]+)\)|(?P<bare>(?:https?://|doi\.org/)[^\s<>"]+)"#,
        )
        .expect("valid hyperlink regex")
    })
}

/// 逐行解析器
///
/// 状态只有两项：标题是否还能出现、等待比较的二级标题。
#[derive(Debug, Default)]
pub struct MarkdownParser {
    title_closed: bool,
    echo: HeadingEcho,
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析整段文本
    ///
    /// 标题之前的空行会被丢弃，保证 `Title` 总是第一个节点。
    pub fn parse(text: &str) -> Vec<StructuralNode> {
        let mut parser = Self::new();
        let mut nodes: Vec<StructuralNode> =
            text.lines().filter_map(|line| parser.parse_line(line)).collect();

        let first_content = nodes
            .iter()
            .position(|node| !matches!(node, StructuralNode::BlankLine));
        if let Some(pos) = first_content {
            if matches!(nodes[pos], StructuralNode::Title(_)) {
                nodes.drain(..pos);
            }
        }
        nodes
    }

    /// 解析一行；返回 `None` 表示该行是标题回显，被丢弃
    pub fn parse_line(&mut self, raw: &str) -> Option<StructuralNode> {
        let line = raw.trim();
        if line.is_empty() {
            return Some(StructuralNode::BlankLine);
        }

        let title_open = !self.title_closed;
        self.title_closed = true;

        if title_open {
            if let Some(rest) = line.strip_prefix(TITLE_MARKER) {
                return Some(StructuralNode::Title(rest.trim().to_string()));
            }
        }

        if let Some(rest) = line.strip_prefix(HEADING2_MARKER) {
            let text = rest.trim();
            self.echo.record(text);
            return Some(StructuralNode::heading(2, text));
        }

        if let Some(rest) = line.strip_prefix(HEADING3_MARKER) {
            self.echo.clear();
            return Some(StructuralNode::heading(3, rest.trim()));
        }

        if self.echo.take_echo(line) {
            return None;
        }

        // 含超链接的行一律是段落，列表标记原样保留
        let runs = split_runs(line);
        if runs.iter().any(Run::is_hyperlink) {
            return Some(StructuralNode::Paragraph(runs));
        }

        if let Some(item) = strip_bullet(line) {
            return Some(StructuralNode::ListItem(vec![Run::plain(item)]));
        }
        if numbered_pattern().is_match(line) {
            return Some(StructuralNode::ListItem(runs));
        }

        Some(StructuralNode::Paragraph(runs))
    }
}

fn strip_bullet(line: &str) -> Option<&str> {
    BULLET_MARKERS
        .iter()
        .find_map(|marker| line.strip_prefix(*marker))
        .map(str::trim_start)
}

/// 把一行文字拆成交替的纯文本 / 超链接 run
pub fn split_runs(line: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut cursor = 0;

    for caps in link_pattern().captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };

        let (start, end, run) = if let (Some(label), Some(target)) = (caps.name("label"), caps.name("target")) {
            (
                whole.start(),
                whole.end(),
                Run::link(label.as_str(), normalize_url(target.as_str())),
            )
        } else if let Some(bare) = caps.name("bare") {
            let url = trim_url_tail(bare.as_str());
            let url_text = normalize_url(url);
            (bare.start(), bare.start() + url.len(), Run::link(url_text.clone(), url_text))
        } else {
            continue;
        };

        if start > cursor {
            runs.push(Run::plain(&line[cursor..start]));
        }
        runs.push(run);
        cursor = end;
    }

    if cursor < line.len() {
        runs.push(Run::plain(&line[cursor..]));
    }
    if runs.is_empty() {
        runs.push(Run::plain(line));
    }
    runs
}

/// 句末标点不属于链接；只有链接里没有 `(` 时才去掉结尾的 `)`
fn trim_url_tail(url: &str) -> &str {
    let mut end = url.len();
    loop {
        let tail = &url[..end];
        match tail.chars().last() {
            Some('.' | ',' | ';' | ':' | '!' | '?' | '\'' | ']') => end -= 1,
            Some(')') if !tail.contains('(') => end -= 1,
            _ => break,
        }
    }
    &url[..end]
}

/// 裸 `doi.org/…` 补全为 `https://doi.org/…`
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("doi.org/") {
        format!("https://{}", url)
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_echo_suppressed() {
        let nodes = MarkdownParser::parse("## Topic\nTopic\n");
        assert_eq!(nodes, vec![StructuralNode::heading(2, "Topic")]);
    }

    #[test]
    fn test_heading_echo_after_blank_line() {
        let nodes = MarkdownParser::parse("## Topic\n\nTopic\nTopic");
        assert_eq!(
            nodes,
            vec![
                StructuralNode::heading(2, "Topic"),
                StructuralNode::BlankLine,
                StructuralNode::plain_paragraph("Topic"),
            ]
        );
    }

    #[test]
    fn test_title_is_one_shot() {
        let nodes = MarkdownParser::parse("# A\nbody\n# B\n");
        assert_eq!(
            nodes,
            vec![
                StructuralNode::Title("A".to_string()),
                StructuralNode::plain_paragraph("body"),
                StructuralNode::plain_paragraph("# B"),
            ]
        );
    }

    #[test]
    fn test_title_only_allowed_first() {
        let nodes = MarkdownParser::parse("intro\n# Late");
        assert_eq!(nodes[1], StructuralNode::plain_paragraph("# Late"));
        assert!(!nodes.iter().any(|n| matches!(n, StructuralNode::Title(_))));
    }

    #[test]
    fn test_heading_levels() {
        let nodes = MarkdownParser::parse("## Two\n### Three\n#### Four");
        assert_eq!(nodes[0], StructuralNode::heading(2, "Two"));
        assert_eq!(nodes[1], StructuralNode::heading(3, "Three"));
        assert_eq!(nodes[2], StructuralNode::plain_paragraph("#### Four"));
    }

    #[test]
    fn test_hyperlink_splitting() {
        let nodes = MarkdownParser::parse("See https://doi.org/10.1/x for more");
        assert_eq!(
            nodes,
            vec![StructuralNode::Paragraph(vec![
                Run::plain("See "),
                Run::link("https://doi.org/10.1/x", "https://doi.org/10.1/x"),
                Run::plain(" for more"),
            ])]
        );
    }

    #[test]
    fn test_bare_doi_normalized() {
        let runs = split_runs("Available at doi.org/10.1/x");
        assert_eq!(runs[1], Run::link("https://doi.org/10.1/x", "https://doi.org/10.1/x"));
    }

    #[test]
    fn test_trailing_period_not_part_of_link() {
        let runs = split_runs("Smith. \"T.\" 2020, https://example.com/a.");
        assert_eq!(runs[1], Run::link("https://example.com/a", "https://example.com/a"));
        assert_eq!(runs[2], Run::plain("."));
    }

    #[test]
    fn test_markdown_link_syntax() {
        let runs = split_runs("read [the paper](https://example.com/p) now");
        assert_eq!(
            runs,
            vec![
                Run::plain("read "),
                Run::link("the paper", "https://example.com/p"),
                Run::plain(" now"),
            ]
        );
    }

    #[test]
    fn test_list_items() {
        let nodes = MarkdownParser::parse("- one\n• two\n* three\n1. four\n2) five\n-notalist");
        assert_eq!(nodes[0], StructuralNode::ListItem(vec![Run::plain("one")]));
        assert_eq!(nodes[1], StructuralNode::ListItem(vec![Run::plain("two")]));
        assert_eq!(nodes[2], StructuralNode::ListItem(vec![Run::plain("three")]));
        assert_eq!(nodes[3], StructuralNode::ListItem(vec![Run::plain("1. four")]));
        assert_eq!(nodes[4], StructuralNode::ListItem(vec![Run::plain("2) five")]));
        assert_eq!(nodes[5], StructuralNode::plain_paragraph("-notalist"));
    }

    #[test]
    fn test_list_line_with_link_becomes_paragraph() {
        let nodes = MarkdownParser::parse("- see https://a.org/x\n1. doi.org/10.1/x");
        assert_eq!(
            nodes,
            vec![
                StructuralNode::Paragraph(vec![
                    Run::plain("- see "),
                    Run::link("https://a.org/x", "https://a.org/x"),
                ]),
                StructuralNode::Paragraph(vec![
                    Run::plain("1. "),
                    Run::link("https://doi.org/10.1/x", "https://doi.org/10.1/x"),
                ]),
            ]
        );
    }

    #[test]
    fn test_leading_blank_lines_dropped_before_title() {
        let nodes = MarkdownParser::parse("\n  \n# T\nbody");
        assert_eq!(
            nodes,
            vec![
                StructuralNode::Title("T".to_string()),
                StructuralNode::plain_paragraph("body"),
            ]
        );
    }

    #[test]
    fn test_leading_blank_lines_kept_without_title() {
        let nodes = MarkdownParser::parse("\nbody");
        assert_eq!(
            nodes,
            vec![StructuralNode::BlankLine, StructuralNode::plain_paragraph("body")]
        );
    }

    #[test]
    fn test_every_line_maps_to_one_node() {
        let text = "# T\n\n## H\nbody ### odd\n\u{0}weird\n```\n|a|b|\n   \n";
        let nodes = MarkdownParser::parse(text);
        assert_eq!(nodes.len(), text.lines().count());
    }

    #[test]
    fn test_blank_lines_preserved() {
        let nodes = MarkdownParser::parse("a\n\n\nb");
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[1], StructuralNode::BlankLine);
        assert_eq!(nodes[2], StructuralNode::BlankLine);
    }
}
