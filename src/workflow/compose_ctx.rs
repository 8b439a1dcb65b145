//! 生成请求上下文
//!
//! 封装"我正在为哪个请求、用什么格式、写多少字"这一信息

use std::fmt::Display;

use tracing::warn;

use crate::models::CitationStyle;

/// 目标字数下限
pub const MIN_TARGET_WORDS: usize = 800;
/// 目标字数上限
pub const MAX_TARGET_WORDS: usize = 7000;
/// 无法解析时使用的目标字数
pub const DEFAULT_TARGET_WORDS: usize = 1500;

/// 单次生成请求的上下文
#[derive(Debug, Clone)]
pub struct ComposeCtx {
    /// 请求ID（仅用于日志显示）
    pub request_id: String,

    /// 引用格式
    pub style: CitationStyle,

    /// 目标字数（已钳制）
    pub target_words: usize,
}

impl ComposeCtx {
    /// 创建新的上下文，自动生成请求ID
    pub fn new(style: CitationStyle, target_words: usize) -> Self {
        Self {
            request_id: short_id(),
            style,
            target_words,
        }
    }
}

impl Display for ComposeCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[请求 #{} 格式#{} 目标#{}词]",
            self.request_id, self.style, self.target_words
        )
    }
}

/// 8 位十六进制随机ID（也用于输出文件名）
pub fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// 解析并钳制目标字数
///
/// 非数字输入使用默认值；超出范围的数字钳制到 [800, 7000]。
pub fn parse_target_words(raw: &str) -> usize {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(value) => value.clamp(MIN_TARGET_WORDS as i64, MAX_TARGET_WORDS as i64) as usize,
        Err(_) if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) => {
            // 纯数字但超出 i64
            MAX_TARGET_WORDS
        }
        Err(_) => {
            warn!(
                "⚠️ 目标字数 '{}' 无法解析，使用默认值 {}",
                trimmed, DEFAULT_TARGET_WORDS
            );
            DEFAULT_TARGET_WORDS
        }
    }
}
