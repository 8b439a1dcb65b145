//! 参考文献来源记录
//!
//! LLM 返回的来源 JSON 字段并不稳定：年份可能是数字，作者可能是数组，
//! DOI 可能叫 `doi` / `url` / `doi_or_url`。这里统一归一化成 [`SourceRecord`]。

use serde::{Deserialize, Deserializer};
use std::fmt;

pub const DEFAULT_AUTHOR: &str = "Unknown Author";
pub const DEFAULT_TITLE: &str = "Untitled";

/// 归一化后的来源记录
///
/// 只在一次生成请求内存在，格式化成参考文献文本后即丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub author: String,
    pub title: String,
    pub journal: Option<String>,
    pub year: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub doi_or_url: Option<String>,
}

impl SourceRecord {
    pub fn new(author: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            journal: None,
            year: None,
            volume: None,
            issue: None,
            pages: None,
            doi_or_url: None,
        }
    }
}

/// LLM 原始返回的来源记录（全部字段宽松解析）
#[derive(Debug, Default, Deserialize)]
pub struct RawSourceRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    author: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    authors: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    journal: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    volume: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    issue: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pages: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    doi_or_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    doi: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    url: Option<String>,
}

impl From<RawSourceRecord> for SourceRecord {
    fn from(raw: RawSourceRecord) -> Self {
        let link = non_empty(raw.doi_or_url)
            .or_else(|| non_empty(raw.doi))
            .or_else(|| non_empty(raw.url))
            .map(|value| normalize_doi(&value));

        Self {
            author: non_empty(raw.author)
                .or_else(|| non_empty(raw.authors))
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            title: non_empty(raw.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            journal: non_empty(raw.journal),
            year: non_empty(raw.year),
            volume: non_empty(raw.volume),
            issue: non_empty(raw.issue),
            pages: non_empty(raw.pages),
            doi_or_url: link,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 裸 DOI（`10.xxxx/...` 或 `doi.org/...`）补全为可点击的 https 链接
fn normalize_doi(value: &str) -> String {
    if value.starts_with("10.") {
        format!("https://doi.org/{}", value)
    } else if value.starts_with("doi.org/") {
        format!("https://{}", value)
    } else {
        value.to_string()
    }
}

/// 字符串、数字、字符串数组都接受；null 视为缺失
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{SeqAccess, Visitor};

    struct LenientVisitor;

    impl<'de> Visitor<'de> for LenientVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number, list of strings or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(LenientVisitor)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut parts = Vec::new();
            while let Some(part) = seq.next_element::<String>()? {
                parts.push(part);
            }
            Ok(Some(parts.join(", ")))
        }
    }

    deserializer.deserialize_any(LenientVisitor)
}
