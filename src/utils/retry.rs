//! 带超时和指数退避的重试

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::LlmError;

/// 重试策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 最多尝试次数（含第一次）
    pub max_attempts: u32,
    /// 第一次重试前的等待，之后每次翻倍
    pub initial_delay: Duration,
    /// 单次等待上限
    pub max_delay: Duration,
    /// 单次调用超时
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            call_timeout: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            initial_delay: config.retry_base_delay(),
            call_timeout: config.request_timeout(),
            ..Self::default()
        }
    }

    /// 第 `attempt` 次失败后的等待时间
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// 执行一次 LLM 调用，瞬时错误按策略重试
///
/// 每次尝试都有独立的超时；不可重试的错误立即返回；
/// 重试次数用尽时返回 [`LlmError::RetriesExhausted`]，其中保留最后一次的错误。
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    model: &str,
    mut operation: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = match timeout(policy.call_timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                model: model.to_string(),
                seconds: policy.call_timeout.as_secs(),
            }),
        };

        match result {
            Ok(value) => {
                if attempt > 1 {
                    info!("✓ 第 {} 次尝试成功", attempt);
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "LLM 调用失败 (尝试 {}/{}): {}，{:?} 后重试...",
                    attempt, max_attempts, e, delay
                );
                sleep(delay).await;
            }
            Err(e) if e.is_retryable() => {
                warn!("LLM 调用失败，已重试 {} 次", attempt);
                return Err(LlmError::RetriesExhausted {
                    model: model.to_string(),
                    attempts: attempt,
                    last: Box::new(e),
                });
            }
            Err(e) => return Err(e),
        }
    }
}
