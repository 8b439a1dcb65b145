//! 结构化文档树
//!
//! Markdown 解析器的输出、docx 渲染器的输入。

/// 段落内的一段行内文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    /// 普通文本
    PlainText(String),
    /// 可点击的超链接
    Hyperlink { text: String, url: String },
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Run::PlainText(text.into())
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Run::Hyperlink {
            text: text.into(),
            url: url.into(),
        }
    }

    /// 该 run 显示出来的文字
    pub fn text(&self) -> &str {
        match self {
            Run::PlainText(text) => text,
            Run::Hyperlink { text, .. } => text,
        }
    }

    pub fn is_hyperlink(&self) -> bool {
        matches!(self, Run::Hyperlink { .. })
    }
}

/// 文档中的一个结构单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralNode {
    /// 文档标题，最多一个，且必须是第一个节点
    Title(String),
    /// 标题，level ∈ {1, 2, 3}
    Heading { level: u8, text: String },
    /// 普通段落
    Paragraph(Vec<Run>),
    /// 项目符号列表项
    ListItem(Vec<Run>),
    /// 空行（保留间距，不合并）
    BlankLine,
}

impl StructuralNode {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        StructuralNode::Heading {
            level,
            text: text.into(),
        }
    }

    /// 只含一个纯文本 run 的段落
    pub fn plain_paragraph(text: impl Into<String>) -> Self {
        StructuralNode::Paragraph(vec![Run::plain(text)])
    }

    /// 节点显示出来的全部文字
    pub fn display_text(&self) -> String {
        match self {
            StructuralNode::Title(text) | StructuralNode::Heading { text, .. } => text.clone(),
            StructuralNode::Paragraph(runs) | StructuralNode::ListItem(runs) => {
                runs.iter().map(Run::text).collect()
            }
            StructuralNode::BlankLine => String::new(),
        }
    }
}

/// 标题回显检测
///
/// LLM 经常在 `## 标题` 之后再原样输出一行标题文字。
/// 解析器（按行）和渲染器（按节点）共用这一规则。
/// 只有紧跟在二级标题之后的第一行非空内容会被比较；比较之后无论是否命中都会清空。
#[derive(Debug, Default, Clone)]
pub struct HeadingEcho {
    pending: Option<String>,
}

impl HeadingEcho {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录刚刚输出的二级标题
    pub fn record(&mut self, heading: &str) {
        self.pending = Some(heading.trim().to_string());
    }

    /// 判断一行非空内容是否为标题回显，并消费掉等待状态
    pub fn take_echo(&mut self, line: &str) -> bool {
        match self.pending.take() {
            Some(heading) => heading == line.trim(),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_only_matches_next_line() {
        let mut echo = HeadingEcho::new();
        echo.record("Topic");
        assert!(echo.take_echo("  Topic "));
        assert!(!echo.take_echo("Topic"));
    }

    #[test]
    fn test_echo_cleared_by_other_content() {
        let mut echo = HeadingEcho::new();
        echo.record("Topic");
        assert!(!echo.take_echo("Something else"));
        assert!(!echo.take_echo("Topic"));
    }

    #[test]
    fn test_display_text_joins_runs() {
        let node = StructuralNode::Paragraph(vec![
            Run::plain("See "),
            Run::link("https://a.b", "https://a.b"),
        ]);
        assert_eq!(node.display_text(), "See https://a.b");
    }
}
