//! docx 渲染 - 业务能力层
//!
//! 按顺序消费 [`StructuralNode`]，生成 WordprocessingML 正文：
//! - `Title` → Title 样式段落，加粗
//! - `Heading` → Heading1/2/3 样式段落
//! - `ListItem` → List Bullet 样式段落
//! - 含超链接的段落 → 超链接 run 带颜色和下划线，并登记为真正的外部超链接关系
//! - `BlankLine` → 空段落（不与相邻段落合并）
//!
//! 渲染不读取时间、不使用随机数：同样的节点序列得到同样的字节。

use tracing::debug;

use crate::infrastructure::docx_package::{escape_xml, DocxPackage, HyperlinkTable, RELATIONSHIPS_NS, WORDML_NS};
use crate::models::{HeadingEcho, Run, StructuralNode};
use crate::services::markdown_parser::MarkdownParser;

const HYPERLINK_COLOR: &str = "0563C1";

/// 渲染 Markdown 文本：解析 + 渲染
///
/// 解析阶段已经去掉了标题回显行，这里不再重复检测。
pub fn render_markdown(markdown: &str) -> DocxPackage {
    let nodes = MarkdownParser::parse(markdown);
    render_sequence(&nodes)
}

/// 渲染节点序列
///
/// 节点序列可能不是解析器产出的，所以先按同样的规则去掉标题回显：
/// 二级标题之后第一个非空节点的文字与标题相同时跳过该节点。
pub fn render_nodes(nodes: &[StructuralNode]) -> DocxPackage {
    let kept = drop_heading_echoes(nodes);
    render_sequence(&kept)
}

fn drop_heading_echoes(nodes: &[StructuralNode]) -> Vec<StructuralNode> {
    let mut echo = HeadingEcho::new();
    let mut kept = Vec::with_capacity(nodes.len());

    for node in nodes {
        match node {
            StructuralNode::Heading { level: 2, text } => echo.record(text),
            StructuralNode::Heading { .. } | StructuralNode::Title(_) => echo.clear(),
            StructuralNode::BlankLine => {}
            StructuralNode::Paragraph(_) | StructuralNode::ListItem(_) => {
                if echo.take_echo(&node.display_text()) {
                    debug!("跳过标题回显: {}", node.display_text());
                    continue;
                }
            }
        }
        kept.push(node.clone());
    }
    kept
}

fn render_sequence(nodes: &[StructuralNode]) -> DocxPackage {
    let mut links = HyperlinkTable::default();
    let mut body = String::new();

    for node in nodes {
        body.push_str(&render_node(node, &mut links));
        body.push('\n');
    }

    debug!(
        "渲染完成: {} 个节点, {} 个超链接",
        nodes.len(),
        links.targets().len()
    );

    let document_xml = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:document xmlns:w="{}" xmlns:r="{}">"#,
            "\n<w:body>\n{}",
            r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#,
            "\n</w:body>\n</w:document>"
        ),
        WORDML_NS, RELATIONSHIPS_NS, body
    );

    DocxPackage::new(document_xml, links)
}

fn render_node(node: &StructuralNode, links: &mut HyperlinkTable) -> String {
    match node {
        StructuralNode::Title(text) => format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:rPr><w:b/></w:rPr>{}</w:r></w:p>"#,
            text_element(text)
        ),
        StructuralNode::Heading { level, text } => format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading{}"/></w:pPr><w:r>{}</w:r></w:p>"#,
            (*level).clamp(1, 3),
            text_element(text)
        ),
        StructuralNode::ListItem(runs) => format!(
            r#"<w:p><w:pPr><w:pStyle w:val="ListBullet"/><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr>{}</w:p>"#,
            render_runs(runs, links)
        ),
        StructuralNode::Paragraph(runs) => format!("<w:p>{}</w:p>", render_runs(runs, links)),
        StructuralNode::BlankLine => "<w:p/>".to_string(),
    }
}

fn render_runs(runs: &[Run], links: &mut HyperlinkTable) -> String {
    runs.iter()
        .map(|run| match run {
            Run::PlainText(text) => format!("<w:r>{}</w:r>", text_element(text)),
            Run::Hyperlink { text, url } => {
                let rel_id = links.rel_id_for(url);
                format!(
                    r#"<w:hyperlink r:id="{}" w:history="1"><w:r><w:rPr><w:rStyle w:val="Hyperlink"/><w:color w:val="{}"/><w:u w:val="single"/></w:rPr>{}</w:r></w:hyperlink>"#,
                    rel_id,
                    HYPERLINK_COLOR,
                    text_element(text)
                )
            }
        })
        .collect()
}

fn text_element(text: &str) -> String {
    format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape_xml(text))
}
