//! docx 容器 - 基础设施层
//!
//! 唯一直接接触 OOXML 打包格式和磁盘的地方。
//! 渲染器只产出 `word/document.xml` 正文和超链接列表，其余部件（样式、编号、关系）都在这里生成。
//!
//! 打包结果只依赖输入内容：zip 条目的时间戳固定为 1980-01-01，同样的文档两次打包字节完全一致。

use std::io::{Cursor, Write};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{AppError, AppResult, FileError};

pub const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const HYPERLINK_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

/// `rId1` 样式、`rId2` 编号，超链接从这里开始编号
const FIRST_HYPERLINK_REL: usize = 3;

/// 文档中的一个外部超链接关系
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperlinkTarget {
    pub rel_id: String,
    pub url: String,
}

/// 超链接关系表，同一个 URL 只登记一次
#[derive(Debug, Default, Clone)]
pub struct HyperlinkTable {
    targets: Vec<HyperlinkTarget>,
}

impl HyperlinkTable {
    /// 返回 URL 对应的关系 ID（不存在则新建）
    pub fn rel_id_for(&mut self, url: &str) -> String {
        if let Some(existing) = self.targets.iter().find(|t| t.url == url) {
            return existing.rel_id.clone();
        }
        let rel_id = format!("rId{}", FIRST_HYPERLINK_REL + self.targets.len());
        self.targets.push(HyperlinkTarget {
            rel_id: rel_id.clone(),
            url: url.to_string(),
        });
        rel_id
    }

    pub fn targets(&self) -> &[HyperlinkTarget] {
        &self.targets
    }
}

/// 一个完整的 docx 文档
#[derive(Debug, Clone)]
pub struct DocxPackage {
    document_xml: String,
    hyperlinks: HyperlinkTable,
}

impl DocxPackage {
    pub fn new(document_xml: String, hyperlinks: HyperlinkTable) -> Self {
        Self {
            document_xml,
            hyperlinks,
        }
    }

    pub fn document_xml(&self) -> &str {
        &self.document_xml
    }

    pub fn hyperlinks(&self) -> &[HyperlinkTarget] {
        self.hyperlinks.targets()
    }

    /// `word/_rels/document.xml.rels`
    pub fn document_rels_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
"#,
        );
        for target in self.hyperlinks.targets() {
            xml.push_str(&format!(
                "  <Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\" TargetMode=\"External\"/>\n",
                target.rel_id,
                HYPERLINK_REL_TYPE,
                escape_xml(&target.url)
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    /// 打包为 docx 字节
    pub fn to_bytes(&self) -> AppResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opt = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let rels = self.document_rels_xml();
        let parts: [(&str, &str); 6] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", PACKAGE_RELS_XML),
            ("word/document.xml", &self.document_xml),
            ("word/styles.xml", STYLES_XML),
            ("word/numbering.xml", NUMBERING_XML),
            ("word/_rels/document.xml.rels", &rels),
        ];

        for (name, content) in parts {
            zip.start_file(name, opt)?;
            zip.write_all(content.as_bytes()).map_err(package_failed)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// 写入磁盘（父目录不存在时自动创建），失败直接返回给调用方
    pub async fn write_to(&self, path: &Path) -> AppResult<()> {
        let bytes = self.to_bytes()?;
        let shown = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
        }

        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| AppError::file_write_failed(shown.clone(), e))?;

        debug!("docx 已写入: {} ({} 字节)", shown, bytes.len());
        Ok(())
    }
}

fn package_failed(err: std::io::Error) -> AppError {
    AppError::File(FileError::PackageFailed {
        source: Box::new(err),
    })
}

/// 转义 XML 文本，并去掉 XML 1.0 不允许出现的控制字符
pub fn escape_xml(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .filter(|&c| c != '\u{FFFE}' && c != '\u{FFFF}')
        .collect();
    quick_xml::escape::escape(cleaned.as_str()).into_owned()
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Title">
    <w:name w:val="Title"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:spacing w:after="240"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="52"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="360" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="28"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading3">
    <w:name w:val="heading 3"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="200" w:after="60"/><w:outlineLvl w:val="2"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="24"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListBullet">
    <w:name w:val="List Bullet"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:numPr><w:numId w:val="1"/></w:numPr><w:ind w:left="720" w:hanging="360"/></w:pPr>
  </w:style>
  <w:style w:type="character" w:styleId="Hyperlink">
    <w:name w:val="Hyperlink"/>
    <w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr>
  </w:style>
</w:styles>"#;

const NUMBERING_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:multiLevelType w:val="singleLevel"/>
    <w:lvl w:ilvl="0">
      <w:start w:val="1"/>
      <w:numFmt w:val="bullet"/>
      <w:lvlText w:val="•"/>
      <w:lvlJc w:val="left"/>
      <w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr>
    </w:lvl>
  </w:abstractNum>
  <w:num w:numId="1">
    <w:abstractNumId w:val="0"/>
  </w:num>
</w:numbering>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn sample_package() -> DocxPackage {
        let mut links = HyperlinkTable::default();
        links.rel_id_for("https://example.com/?a=1&b=2");
        DocxPackage::new("<w:document/>".to_string(), links)
    }

    #[test]
    fn test_hyperlink_table_dedupes() {
        let mut table = HyperlinkTable::default();
        assert_eq!(table.rel_id_for("https://a.org"), "rId3");
        assert_eq!(table.rel_id_for("https://b.org"), "rId4");
        assert_eq!(table.rel_id_for("https://a.org"), "rId3");
        assert_eq!(table.targets().len(), 2);
    }

    #[test]
    fn test_rels_mark_hyperlinks_external() {
        let rels = sample_package().document_rels_xml();
        assert!(rels.contains(
            r#"Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External""#
        ));
    }

    #[test]
    fn test_zip_contains_all_parts() {
        let bytes = sample_package().to_bytes().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/numbering.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(archive.by_name(name).is_ok(), "缺少部件 {}", name);
        }

        let mut document = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut document)
            .unwrap();
        assert_eq!(document, "<w:document/>");
    }

    #[test]
    fn test_packaging_is_deterministic() {
        let package = sample_package();
        assert_eq!(package.to_bytes().unwrap(), package.to_bytes().unwrap());
    }

    #[test]
    fn test_escape_xml_drops_control_chars() {
        assert_eq!(escape_xml("a<b>&\u{0}c\u{7}"), "a&lt;b&gt;&amp;c");
    }

    #[tokio::test]
    async fn test_write_to_missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.docx");
        sample_package().write_to(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // 父路径是一个普通文件，无法创建目录
        let path = blocker.join("out.docx");
        let result = sample_package().write_to(&path).await;
        assert!(matches!(result, Err(AppError::File(FileError::WriteFailed { .. }))));
    }
}
