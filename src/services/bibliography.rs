//! 参考文献格式化 - 业务能力层
//!
//! 输入来源记录（或一段原始引用文本）和引用格式，输出带标题的参考文献区块。
//! 条目格式固定为：
//!
//! ```text
//! author. "title." journal, vol. V, no. N, pp. P, year, doi.
//! ```
//!
//! 空字段直接省略，每条恰好一个结尾句号，条目之间空一行，最多取前 8 条。

use tracing::{debug, warn};

use crate::models::{CitationStyle, RawSourceRecord, SourceRecord};
use crate::utils::json::extract_json;

/// 参考文献最多保留的条目数
pub const MAX_SOURCES: usize = 8;

/// 参考文献区块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibliographyBlock {
    pub heading: String,
    pub entries: Vec<String>,
}

impl BibliographyBlock {
    /// 没有任何条目的区块（只有标题）
    pub fn empty(style: CitationStyle) -> Self {
        Self {
            heading: style.bibliography_heading().to_string(),
            entries: Vec::new(),
        }
    }

    /// 输出为 Markdown：二级标题 + 空行分隔的条目
    pub fn to_markdown(&self) -> String {
        let mut out = format!("## {}\n", self.heading);
        for entry in &self.entries {
            out.push('\n');
            out.push_str(entry);
            out.push('\n');
        }
        out
    }
}

/// 由来源记录生成参考文献
pub fn format_bibliography(records: &[SourceRecord], style: CitationStyle) -> BibliographyBlock {
    BibliographyBlock {
        heading: style.bibliography_heading().to_string(),
        entries: records.iter().take(MAX_SOURCES).map(format_entry).collect(),
    }
}

/// 由一段原始引用文本生成参考文献：每个非空行一条
pub fn format_raw_bibliography(blob: &str, style: CitationStyle) -> BibliographyBlock {
    let entries = blob
        .lines()
        .map(clean_raw_line)
        .filter(|line| !line.is_empty() && !is_bibliography_heading(line))
        .take(MAX_SOURCES)
        .map(|line| with_single_period(&line))
        .collect();

    BibliographyBlock {
        heading: style.bibliography_heading().to_string(),
        entries,
    }
}

/// 格式化单条来源
pub fn format_entry(record: &SourceRecord) -> String {
    let author = record.author.trim().trim_end_matches('.');
    let title = record.title.trim().trim_end_matches('.');
    let head = format!("{}. \"{}.\"", author, title);

    let mut tail: Vec<String> = Vec::new();
    if let Some(journal) = &record.journal {
        tail.push(journal.clone());
    }
    if let Some(volume) = &record.volume {
        tail.push(format!("vol. {}", volume));
    }
    if let Some(issue) = &record.issue {
        tail.push(format!("no. {}", issue));
    }
    if let Some(pages) = &record.pages {
        tail.push(format!("pp. {}", pages));
    }
    if let Some(year) = &record.year {
        tail.push(year.clone());
    }
    if let Some(link) = &record.doi_or_url {
        tail.push(link.clone());
    }

    if tail.is_empty() {
        head
    } else {
        with_single_period(&format!("{} {}", head, tail.join(", ")))
    }
}

/// 解析 LLM 返回的来源列表
///
/// 接受 `{"sources": [...]}` 或直接的数组。整体解析失败时返回空列表（只记日志，不报错），
/// 单条记录解析失败时跳过该条。
pub fn parse_source_list(payload: &str) -> Vec<SourceRecord> {
    let Some(json) = extract_json(payload) else {
        warn!("⚠️ 来源列表中没有找到 JSON，参考文献将为空");
        return Vec::new();
    };

    let value: serde_json::Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            warn!("⚠️ 来源列表 JSON 解析失败: {}，参考文献将为空", e);
            return Vec::new();
        }
    };

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("sources") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                warn!("⚠️ 来源 JSON 中没有 sources 数组，参考文献将为空");
                return Vec::new();
            }
        },
        _ => return Vec::new(),
    };

    records_from_values(items)
}

/// 逐条把 JSON 值转换为来源记录，最多 [`MAX_SOURCES`] 条
pub fn records_from_values(items: Vec<serde_json::Value>) -> Vec<SourceRecord> {
    let total = items.len();
    let records: Vec<SourceRecord> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawSourceRecord>(item) {
            Ok(raw) => Some(SourceRecord::from(raw)),
            Err(e) => {
                debug!("跳过无法解析的来源: {}", e);
                None
            }
        })
        .take(MAX_SOURCES)
        .collect();

    if records.len() < total.min(MAX_SOURCES) {
        warn!("⚠️ {} 条来源中只有 {} 条可用", total, records.len());
    }
    records
}

fn with_single_period(text: &str) -> String {
    format!("{}.", text.trim_end().trim_end_matches('.'))
}

fn clean_raw_line(line: &str) -> String {
    let line = line.trim();
    let line = ["- ", "• ", "* "]
        .iter()
        .find_map(|marker| line.strip_prefix(*marker))
        .unwrap_or(line);
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    let line = if digits > 0 {
        line[digits..]
            .strip_prefix(". ")
            .or_else(|| line[digits..].strip_prefix(") "))
            .unwrap_or(line)
    } else {
        line
    };
    line.trim().to_string()
}

fn is_bibliography_heading(line: &str) -> bool {
    let bare = line.trim_start_matches('#').trim().trim_end_matches(':');
    ["references", "works cited", "bibliography"]
        .iter()
        .any(|heading| bare.eq_ignore_ascii_case(heading))
}
