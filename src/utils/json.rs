/// 从 LLM 回复中截取第一个合法的 JSON 对象或数组
///
/// 回复经常被 Markdown 代码块包裹，或者前后带有说明文字（其中可能有 `[JSON]` 之类的括号）。
/// 依次尝试每个 `{` / `[` 起点，按括号配对截取（跳过字符串内的括号），
/// 返回第一个能被 serde_json 解析的片段；都不合法时返回 `None`。
pub fn extract_json(text: &str) -> Option<&str> {
    first_valid(text, &['{', '['])
}

/// 同 [`extract_json`]，但只接受 `{...}` 对象
pub fn extract_json_object(text: &str) -> Option<&str> {
    first_valid(text, &['{'])
}

fn first_valid<'a>(text: &'a str, openers: &[char]) -> Option<&'a str> {
    text.char_indices()
        .filter(|(_, c)| openers.contains(c))
        .filter_map(|(start, _)| balanced_from(text, start))
        .find(|candidate| serde_json::from_str::<serde_json::Value>(candidate).is_ok())
}

/// 从 `start` 处的括号开始，截取到与之配对的右括号
fn balanced_from(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
