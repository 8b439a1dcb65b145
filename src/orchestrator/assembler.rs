//! 产物组装器 - 编排层
//!
//! 对外只暴露两个入口：
//! - `assemble_worksheet(provider, 原文, 格式, 主题提示) → docx 路径`
//! - `assemble_essay(provider, 原文, 格式, 目标字数) → docx 路径 + 统计`
//!
//! 每个入口：运行对应流程 → 渲染 → 生成唯一文件名 → 写入输出目录。
//! provider 在调用时传入，组装器自身只持有输出目录。

use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::CitationStyle;
use crate::services::docx_renderer::render_markdown;
use crate::services::TextProvider;
use crate::utils::logging::{log_artifact_written, log_essay_report};
use crate::workflow::compose_ctx::{parse_target_words, short_id, ComposeCtx};
use crate::workflow::{EssayFlow, WorksheetFlow};

const WORKSHEET_PREFIX: &str = "COMPLETED_";
const ESSAY_PREFIX: &str = "ESSAY_";
const DOCX_EXTENSION: &str = ".docx";

/// 论文统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EssayReport {
    pub title: String,
    pub sections_written: usize,
    pub total_words: usize,
    pub target_words: usize,
    pub plan_fell_back: bool,
}

/// 论文产物：文件路径 + 统计
#[derive(Debug, Clone)]
pub struct EssayArtifact {
    pub path: PathBuf,
    pub report: EssayReport,
}

/// 产物组装器
pub struct Assembler {
    output_dir: PathBuf,
}

impl Assembler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 完成作业并写出 `COMPLETED_xxxxxxxx.docx`
    pub async fn assemble_worksheet(
        &self,
        provider: &dyn TextProvider,
        raw_text: &str,
        style: &str,
        topic_hint: &str,
    ) -> AppResult<PathBuf> {
        let style = CitationStyle::parse(style);
        let ctx = ComposeCtx::new(style, 0);

        let markdown = WorksheetFlow::new(provider)
            .run(raw_text, topic_hint, &ctx)
            .await?;

        let path = self.unique_path(WORKSHEET_PREFIX);
        render_markdown(&markdown).write_to(&path).await?;
        log_artifact_written("作业", &path);

        Ok(path)
    }

    /// 生成论文并写出 `ESSAY_xxxxxxxx.docx`
    ///
    /// `target_words` 是原始输入，解析失败或超出范围不会报错（见 [`parse_target_words`]）。
    pub async fn assemble_essay(
        &self,
        provider: &dyn TextProvider,
        raw_text: &str,
        style: &str,
        target_words: &str,
    ) -> AppResult<EssayArtifact> {
        let style = CitationStyle::parse(style);
        let ctx = ComposeCtx::new(style, parse_target_words(target_words));
        info!("{} 🚀 开始生成论文", ctx);

        let draft = EssayFlow::new(provider).run(raw_text, &ctx).await?;

        let path = self.unique_path(ESSAY_PREFIX);
        render_markdown(&draft.markdown).write_to(&path).await?;
        log_artifact_written("论文", &path);

        let report = EssayReport {
            title: draft.plan.plan().title.clone(),
            sections_written: draft.sections.len(),
            total_words: draft.total_words,
            target_words: ctx.target_words,
            plan_fell_back: draft.plan.is_fallback(),
        };
        log_essay_report(
            &report.title,
            report.sections_written,
            report.total_words,
            report.target_words,
            report.plan_fell_back,
        );

        Ok(EssayArtifact { path, report })
    }

    /// 把调用方给出的文件名解析为输出目录中的路径
    ///
    /// 只接受单个普通文件名：拒绝空名、路径分隔符、`.`/`..` 和绝对路径。
    /// 不检查文件是否存在。
    pub fn resolve_output_file(&self, name: &str) -> AppResult<PathBuf> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.contains(|c: char| c == '/' || c == '\\') {
            return Err(AppError::invalid_file_name(name));
        }

        let mut components = Path::new(trimmed).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => Ok(self.output_dir.join(file)),
            _ => Err(AppError::invalid_file_name(name)),
        }
    }

    fn unique_path(&self, prefix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{}{}", prefix, short_id(), DOCX_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output_file_accepts_plain_name() {
        let assembler = Assembler::new("uploads");
        let path = assembler.resolve_output_file("ESSAY_1234abcd.docx").unwrap();
        assert_eq!(path, Path::new("uploads").join("ESSAY_1234abcd.docx"));
    }

    #[test]
    fn test_resolve_output_file_rejects_traversal() {
        let assembler = Assembler::new("uploads");
        for name in ["", "  ", "..", ".", "../secret.docx", "a/b.docx", "a\\b.docx", "/etc/passwd"] {
            assert!(
                assembler.resolve_output_file(name).is_err(),
                "应拒绝: {:?}",
                name
            );
        }
    }

    #[test]
    fn test_unique_path_shape() {
        let assembler = Assembler::new("out");
        let path = assembler.unique_path(ESSAY_PREFIX);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("ESSAY_"));
        assert!(name.ends_with(".docx"));
        assert_eq!(name.len(), "ESSAY_".len() + 8 + ".docx".len());
        assert_ne!(path, assembler.unique_path(ESSAY_PREFIX));
    }
}
