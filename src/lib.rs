//! # Orangebird Filler
//!
//! 把一份已提取的作业文本变成两个 Word 文档：完成版作业和一篇按字数预算生成的论文
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露能力，不理解业务
//! - `DocxPackage` - 把 WordprocessingML 打包为 docx 并写盘
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务只做一件事
//! - `MarkdownParser` - 逐行把 Markdown 解析为结构节点
//! - `docx_renderer` - 把结构节点渲染为 docx（标题、列表、超链接）
//! - `bibliography` - 按引用格式生成参考文献
//! - `LlmService` - 文本生成能力（`TextProvider` 的实现）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个产物"的完整生成流程
//! - `ComposeCtx` - 上下文封装（请求ID + 引用格式 + 目标字数）
//! - `WorksheetFlow` - 一次请求完成作业
//! - `EssayFlow` - 大纲 → 逐章节（字数预算）→ 拼装
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/assembler` - 运行流程、渲染、写出唯一文件名
//! - `orchestrator/app` - 命令行入口，按运行模式调度
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, RunMode};
pub use error::{AppError, AppResult};
pub use infrastructure::DocxPackage;
pub use models::{CitationStyle, GenerationRequest, PlanOutcome, Stage, StructuralNode};
pub use orchestrator::{App, Assembler, EssayArtifact, EssayReport};
pub use services::{LlmService, TextProvider};
pub use workflow::{ComposeCtx, EssayFlow, WorksheetFlow};
