use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次 LLM 调用超时（秒）
    pub request_timeout_secs: u64,
    /// 单次调用最多尝试次数（含第一次）
    pub max_retries: u32,
    /// 重试退避的初始等待（毫秒），之后每次翻倍
    pub retry_base_delay_ms: u64,
    // --- 输出配置 ---
    /// 生成的 docx 存放目录
    pub output_dir: String,
    // --- 单次运行参数 ---
    /// 已提取好的纯文本作业文件
    pub input_file: String,
    /// 引用格式名称（APA / MLA / Chicago ...）
    pub citation_style: String,
    /// 作业的主题提示
    pub topic_hint: String,
    /// 目标字数（原始字符串，由编排层解析与钳制）
    pub target_words: String,
    /// 运行模式
    pub run_mode: RunMode,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

/// 运行模式：生成哪些产物
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    Worksheet,
    Essay,
    Both,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "worksheet" => Ok(RunMode::Worksheet),
            "essay" => Ok(RunMode::Essay),
            "both" => Ok(RunMode::Both),
            _ => Err(ConfigError::EnvVarParseFailed {
                var_name: "RUN_MODE".to_string(),
                value: value.to_string(),
                expected_type: "worksheet | essay | both".to_string(),
            }),
        }
    }
}

impl RunMode {
    pub fn includes_worksheet(self) -> bool {
        matches!(self, RunMode::Worksheet | RunMode::Both)
    }

    pub fn includes_essay(self) -> bool {
        matches!(self, RunMode::Essay | RunMode::Both)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.groq.com/openai/v1".to_string(),
            llm_model_name: "llama-3.3-70b-versatile".to_string(),
            request_timeout_secs: 120,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            output_dir: "uploads".to_string(),
            input_file: "worksheet.txt".to_string(),
            citation_style: "MLA".to_string(),
            topic_hint: String::new(),
            target_words: "1500".to_string(),
            run_mode: RunMode::Both,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载配置（先读取 `.env`，无法解析的值回退到默认值）
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            max_retries: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retries),
            retry_base_delay_ms: std::env::var("RETRY_BASE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_base_delay_ms),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            input_file: std::env::var("INPUT_FILE").unwrap_or(default.input_file),
            citation_style: std::env::var("CITATION_STYLE").unwrap_or(default.citation_style),
            topic_hint: std::env::var("TOPIC_HINT").unwrap_or(default.topic_hint),
            target_words: std::env::var("TARGET_WORDS").unwrap_or(default.target_words),
            run_mode: std::env::var("RUN_MODE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.run_mode),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 检查会导致请求必然失败的配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "LLM_API_KEY".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::EnvVarParseFailed {
                var_name: "REQUEST_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
                expected_type: "正整数".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("Essay".parse::<RunMode>().unwrap(), RunMode::Essay);
        assert_eq!(" both ".parse::<RunMode>().unwrap(), RunMode::Both);
        assert!(matches!(
            "pdf".parse::<RunMode>(),
            Err(ConfigError::EnvVarParseFailed { .. })
        ));
        assert!(RunMode::Both.includes_worksheet());
        assert!(!RunMode::Essay.includes_worksheet());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.target_words, "1500");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_validate() {
        let missing_key = Config::default();
        assert!(matches!(
            missing_key.validate(),
            Err(ConfigError::EnvVarNotFound { .. })
        ));

        let zero_timeout = Config {
            llm_api_key: "key".to_string(),
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(matches!(
            zero_timeout.validate(),
            Err(ConfigError::EnvVarParseFailed { .. })
        ));

        let ok = Config {
            llm_api_key: "key".to_string(),
            ..Config::default()
        };
        assert!(ok.validate().is_ok());
    }
}
