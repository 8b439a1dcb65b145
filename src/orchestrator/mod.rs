//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层把流程、渲染和写盘串起来，是对外暴露的入口。
//!
//! ## 模块划分
//!
//! ### `assembler` - 产物组装器
//! - `assemble_worksheet`：作业流程 → 渲染 → `COMPLETED_xxxxxxxx.docx`
//! - `assemble_essay`：论文流程 → 渲染 → `ESSAY_xxxxxxxx.docx` + 统计
//! - `resolve_output_file`：把调用方给出的文件名限制在输出目录内
//!
//! ### `app` - 命令行入口
//! - 管理应用生命周期（初始化、运行）
//! - 持有唯一的 `LlmService`，调用时借给组装器
//!
//! ## 层次关系
//!
//! ```text
//! app (读取输入，按模式调度)
//!     ↓
//! assembler (单个产物：流程 + 渲染 + 写盘)
//!     ↓
//! workflow::{WorksheetFlow, EssayFlow}
//!     ↓
//! services (能力层：llm / parser / renderer / bibliography)
//!     ↓
//! infrastructure (基础设施：DocxPackage)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → workflow → services → infrastructure
//! 2. **依赖注入**：provider 在调用时传入，组装器不持有
//! 3. **无业务逻辑**：只做调度和写盘，不解析 LLM 回复

pub mod app;
pub mod assembler;

// 重新导出主要类型
pub use app::App;
pub use assembler::{Assembler, EssayArtifact, EssayReport};
