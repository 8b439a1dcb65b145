//! LLM 服务 - 业务能力层
//!
//! 只负责"生成文本"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Groq, Azure, Gemini 等）
//!
//! 编排层只依赖 [`TextProvider`] trait，测试时注入桩实现即可，不需要真实的网络调用。

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppResult, LlmError};
use crate::models::GenerationRequest;
use crate::utils::retry::{with_retry, RetryPolicy};

/// 服务端明确拒绝、重试也不会成功的错误类型/错误码
const NON_TRANSIENT_KINDS: &[&str] = &[
    "invalid_request_error",
    "authentication_error",
    "permission_error",
    "not_found_error",
    "insufficient_quota",
    "invalid_api_key",
    "model_not_found",
    "context_length_exceeded",
];

/// 文本生成能力
///
/// 每个流水线阶段发起一次请求，回复被当作不透明的字符串
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> AppResult<String>;
}

/// LLM 服务
///
/// 职责：
/// - 调用兼容 OpenAI 的接口生成文本
/// - 每次调用带超时，瞬时失败按策略重试
/// - 不关心请求属于哪个阶段
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    retry: RetryPolicy,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 单次 LLM 调用（不重试）
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `temperature`: 采样温度
    /// - `max_tokens`: 最大生成 token 数
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（去掉首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let invalid = |e: OpenAIError| classify_api_error(&self.model_name, e);

        // 构建消息列表
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(invalid)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(invalid)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()
            .map_err(invalid)?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            classify_api_error(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

/// 把 async-openai 的错误归为可重试或不可重试
///
/// 5xx 和 429 已由客户端自身退避重试，到这里的 `ApiError` 若带有
/// 鉴权、参数、配额等类型或错误码，就不再交给重试策略。
fn classify_api_error(model: &str, err: OpenAIError) -> LlmError {
    let permanent = match &err {
        OpenAIError::InvalidArgument(_) => true,
        OpenAIError::ApiError(api) => is_non_transient(api),
        _ => false,
    };

    if permanent {
        LlmError::InvalidRequest {
            model: model.to_string(),
            message: err.to_string(),
        }
    } else {
        LlmError::ApiCallFailed {
            model: model.to_string(),
            source: Box::new(err),
        }
    }
}

fn is_non_transient(api: &ApiError) -> bool {
    [api.r#type.as_deref(), api.code.as_deref()]
        .into_iter()
        .flatten()
        .any(|kind| NON_TRANSIENT_KINDS.contains(&kind))
}

#[async_trait]
impl TextProvider for LlmService {
    async fn generate(&self, request: &GenerationRequest) -> AppResult<String> {
        debug!("[{}] 发送生成请求", request.stage);
        let content = with_retry(&self.retry, &self.model_name, || {
            self.send_to_llm(
                &request.prompt,
                request.system.as_deref(),
                request.temperature,
                request.max_tokens,
            )
        })
        .await?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stage;

    /// 创建测试用的 LlmService（从环境变量读取真实配置）
    fn create_test_service() -> LlmService {
        LlmService::new(&Config::from_env())
    }

    #[test]
    fn test_service_uses_configured_model() {
        let config = Config {
            llm_model_name: "test-model".to_string(),
            ..Config::default()
        };
        let service = LlmService::new(&config);
        assert_eq!(service.model_name(), "test-model");
        assert_eq!(service.retry.max_attempts, config.max_retries);
    }

    fn api_error(kind: Option<&str>, code: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: "request rejected".to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        })
    }

    #[test]
    fn test_rejected_requests_are_not_retried() {
        let cases = [
            api_error(Some("authentication_error"), None),
            api_error(Some("invalid_request_error"), Some("context_length_exceeded")),
            api_error(None, Some("invalid_api_key")),
            OpenAIError::InvalidArgument("max_tokens".to_string()),
        ];
        for err in cases {
            let mapped = classify_api_error("m", err);
            assert!(matches!(mapped, LlmError::InvalidRequest { .. }), "{:?}", mapped);
            assert!(!mapped.is_retryable());
        }
    }

    #[test]
    fn test_server_errors_stay_retryable() {
        // 服务端错误没有 type/code
        let mapped = classify_api_error("m", api_error(None, None));
        assert!(matches!(mapped, LlmError::ApiCallFailed { .. }));
        assert!(mapped.is_retryable());

        let mapped = classify_api_error("m", api_error(Some("server_error"), None));
        assert!(mapped.is_retryable());
    }

    /// 测试通用 LLM 调用
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_generate_simple -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_generate_simple() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = create_test_service();
        let request = GenerationRequest::new(Stage::Worksheet, "Reply with the single word: ready")
            .with_system("You are a terse assistant.")
            .with_sampling(0.0, 16);

        match service.generate(&request).await {
            Ok(response) => {
                println!("LLM 响应: {}", response);
                assert!(!response.is_empty());
            }
            Err(e) => panic!("LLM 调用失败: {}", e),
        }
    }
}
