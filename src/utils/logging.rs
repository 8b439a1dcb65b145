/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则本 crate 默认 info，`verbose` 时为 debug。
/// 重复初始化（例如测试中）会被忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose {
        "orangebird_filler=debug"
    } else {
        "orangebird_filler=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🤖 模型: {} @ {}", config.llm_model_name, config.llm_api_base_url);
    info!("📄 输入文件: {}", config.input_file);
    info!("📁 输出目录: {}", config.output_dir);
    info!(
        "📚 引用格式: {} | 目标字数: {} | 模式: {:?}",
        config.citation_style, config.target_words, config.run_mode
    );
    info!("{}", "=".repeat(60));
}

/// 记录产物写入
///
/// # 参数
/// - `kind`: 产物类型（作业 / 论文）
/// - `path`: 文件路径
pub fn log_artifact_written(kind: &str, path: &Path) {
    info!("💾 {}已保存: {}", kind, path.display());
}

/// 记录论文统计
///
/// # 参数
/// - `title`: 论文标题
/// - `sections`: 实际生成的章节数
/// - `total_words`: 正文累计字数
/// - `target_words`: 目标字数
/// - `fallback`: 是否使用了默认大纲
pub fn log_essay_report(
    title: &str,
    sections: usize,
    total_words: usize,
    target_words: usize,
    fallback: bool,
) {
    info!("\n{}", "─".repeat(60));
    info!("📊 论文: {}", title);
    info!("✅ 章节: {} | 字数: {}/{}", sections, total_words, target_words);
    if fallback {
        info!("⚠️ 本次使用了默认大纲");
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
