//! 基础设施层
//!
//! 只负责把已渲染好的 WordprocessingML 打包成 docx 并写盘，不理解 Markdown。

pub mod docx_package;

pub use docx_package::{DocxPackage, HyperlinkTable};
