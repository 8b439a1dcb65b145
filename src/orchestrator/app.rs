//! 应用入口 - 编排层
//!
//! 读取已提取好的作业文本，按 `RUN_MODE` 依次生成作业和论文，输出文件路径。
//! 两个产物严格串行生成，互不共享状态。

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::orchestrator::assembler::Assembler;
use crate::services::LlmService;
use crate::utils::logging::log_startup;

/// 应用主结构
pub struct App {
    config: Config,
    assembler: Assembler,
    llm: LlmService,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        // 兼容本地无需密钥的服务，只提示不退出
        if let Err(e) = config.validate() {
            warn!("⚠️ {}，请求可能被拒绝", e);
        }

        let llm = LlmService::new(&config);
        let assembler = Assembler::new(&config.output_dir);

        Ok(Self {
            config,
            assembler,
            llm,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let raw_text = tokio::fs::read_to_string(&self.config.input_file)
            .await
            .map_err(|e| AppError::file_read_failed(&self.config.input_file, e))?;

        if raw_text.trim().is_empty() {
            warn!("⚠️ 输入文件为空，程序结束");
            return Ok(());
        }
        info!("📄 已读取作业文本: {} 字符", raw_text.chars().count());

        let mode = self.config.run_mode;

        if mode.includes_worksheet() {
            let path = self
                .assembler
                .assemble_worksheet(
                    &self.llm,
                    &raw_text,
                    &self.config.citation_style,
                    &self.config.topic_hint,
                )
                .await
                .inspect_err(|e| error!("❌ 作业生成失败: {}", e))?;
            println!("{}", path.display());
        }

        if mode.includes_essay() {
            let artifact = self
                .assembler
                .assemble_essay(
                    &self.llm,
                    &raw_text,
                    &self.config.citation_style,
                    &self.config.target_words,
                )
                .await
                .inspect_err(|e| error!("❌ 论文生成失败: {}", e))?;
            println!("{}", artifact.path.display());
        }

        info!("✅ 全部完成");
        Ok(())
    }
}
