use thiserror::Error;

/// 应用程序错误类型
///
/// 只有"必须让调用方知道"的失败才会变成 `AppError`：
/// 计划 JSON 解析失败、字数参数非法、无法识别的 Markdown 行都在本地降级处理，不会出现在这里。
#[derive(Debug, Error)]
pub enum AppError {
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 请求无效：构建失败或被服务端拒绝，重试无意义
    #[error("LLM 请求无效 (模型: {model}): {message}")]
    InvalidRequest { model: String, message: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 单次调用超时
    #[error("LLM调用超时 (模型: {model}, {seconds}秒)")]
    Timeout { model: String, seconds: u64 },
    /// 重试次数用尽
    #[error("LLM调用失败，已尝试 {attempts} 次 (模型: {model}): {last}")]
    RetriesExhausted {
        model: String,
        attempts: u32,
        #[source]
        last: Box<LlmError>,
    },
}

impl LlmError {
    /// 是否属于可重试的瞬时错误
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::ApiCallFailed { .. } | LlmError::EmptyContent { .. } | LlmError::Timeout { .. }
        )
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 打包 docx 失败
    #[error("生成 docx 容器失败: {source}")]
    PackageFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 非法文件名（路径穿越等）
    #[error("非法文件名: {name}")]
    InvalidFileName { name: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
}

// ========== 从常见错误类型转换 ==========

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::File(FileError::PackageFailed {
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建非法文件名错误
    pub fn invalid_file_name(name: impl Into<String>) -> Self {
        AppError::File(FileError::InvalidFileName { name: name.into() })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let timeout = LlmError::Timeout {
            model: "m".to_string(),
            seconds: 5,
        };
        assert!(timeout.is_retryable());

        let invalid = LlmError::InvalidRequest {
            model: "m".to_string(),
            message: "bad".to_string(),
        };
        assert!(!invalid.is_retryable());

        let exhausted = LlmError::RetriesExhausted {
            model: "m".to_string(),
            attempts: 3,
            last: Box::new(timeout),
        };
        assert!(!exhausted.is_retryable());
    }

    #[test]
    fn test_write_failure_keeps_path() {
        let err = AppError::file_write_failed(
            "uploads/ESSAY.docx",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("uploads/ESSAY.docx"));
    }
}
