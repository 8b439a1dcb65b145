//! 字数统计 - 业务能力层
//!
//! 只用于字数预算，不追求语言学意义上的准确

use regex::Regex;
use std::sync::OnceLock;

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\w+").expect("valid word regex"))
}

/// 统计文本中的单词数（字母、数字、下划线组成的连续片段）
pub fn count_words(text: &str) -> usize {
    word_pattern().find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_words_basic() {
        assert_eq!(count_words("The quick brown fox"), 4);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t "), 0);
    }

    #[test]
    fn test_punctuation_splits_tokens() {
        // "don't" 被拆成 don / t，"snake_case" 保持一个
        assert_eq!(count_words("don't stop, snake_case!"), 4);
        assert_eq!(count_words("## Heading 2"), 2);
    }
}
