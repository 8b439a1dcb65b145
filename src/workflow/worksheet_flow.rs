//! 作业完成流程 - 流程层
//!
//! 一次 LLM 请求，把原始作业补全为 Markdown。该流程不参与字数预算。

use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::{GenerationRequest, Stage};
use crate::services::TextProvider;
use crate::utils::logging::truncate_text;
use crate::workflow::compose_ctx::ComposeCtx;
use crate::workflow::prompts;

/// 作业文档缺少标题时使用的标题
pub const WORKSHEET_TITLE: &str = "Completed Assignment";

const WORKSHEET_TEMPERATURE: f32 = 0.3;
const WORKSHEET_MAX_TOKENS: u32 = 8000;

/// 作业完成流程
///
/// - 不持有 provider，只在调用时借用
/// - 只产出 Markdown，渲染和写文件由编排层负责
pub struct WorksheetFlow<'a> {
    provider: &'a dyn TextProvider,
}

impl<'a> WorksheetFlow<'a> {
    pub fn new(provider: &'a dyn TextProvider) -> Self {
        Self { provider }
    }

    pub async fn run(&self, text: &str, topic_hint: &str, ctx: &ComposeCtx) -> AppResult<String> {
        info!("{} 📝 正在生成完成版作业...", ctx);

        let request = GenerationRequest::new(
            Stage::Worksheet,
            prompts::worksheet_prompt(text, ctx.style, topic_hint),
        )
        .with_system(prompts::WORKSHEET_SYSTEM)
        .with_sampling(WORKSHEET_TEMPERATURE, WORKSHEET_MAX_TOKENS);

        let markdown = self.provider.generate(&request).await?;
        debug!("{} 作业回复预览: {}", ctx, truncate_text(&markdown, 80));

        Ok(ensure_title(&markdown))
    }
}

/// 第一行非空内容不是 `# ` 标题时，补上默认标题
pub fn ensure_title(markdown: &str) -> String {
    let has_title = markdown
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim_start().starts_with("# "))
        .unwrap_or(false);

    if has_title {
        markdown.to_string()
    } else {
        format!("# {}\n\n{}", WORKSHEET_TITLE, markdown)
    }
}
