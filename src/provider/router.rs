//! 模型路由：重试、回退与总时限
//!
//! 每个模型最多重试固定次数（线性退避，有上限），随后按顺序切换到回退模型。
//! 鉴权、地区类失败对所有模型都无法修复，立即失败；模型不可用直接跳到下一个模型。
//! 整个尝试序列受总时限约束，超出后立即返回超时错误。
//!
//! 主模型连续失败后会被标记为「降级」，冷却期内的调用直接从回退模型开始。
//! 降级时间戳保存在显式传入的 [`ProviderSelection`] 中，而不是全局状态。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use super::{CompletionProvider, CompletionRequest};
use crate::config::{constants, GateConfig};
use crate::error::{GateError, GateResult, ProviderError, ProviderFailure};

/// 模型选择上下文（每个进程一个，在各流水线之间共享）
#[derive(Debug)]
pub struct ProviderSelection {
    primary: String,
    fallbacks: Vec<String>,
    cooldown: Duration,
    degraded_until: Mutex<Option<Instant>>,
}

impl ProviderSelection {
    pub fn new(primary: impl Into<String>, fallbacks: Vec<String>, cooldown: Duration) -> Self {
        Self {
            primary: primary.into(),
            fallbacks,
            cooldown,
            degraded_until: Mutex::new(None),
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(
            config.primary_model.clone(),
            config.fallback_models.clone(),
            config.degraded_cooldown(),
        )
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// 标记主模型降级，冷却期内跳过
    pub fn mark_degraded(&self) {
        let until = Instant::now() + self.cooldown;
        let mut guard = self.degraded_until.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(until);
        tracing::warn!("主模型 {} 已标记为降级，冷却 {:?}", self.primary, self.cooldown);
    }

    pub fn is_degraded(&self) -> bool {
        let guard = self.degraded_until.lock().unwrap_or_else(|e| e.into_inner());
        guard.map(|until| Instant::now() < until).unwrap_or(false)
    }

    /// 本次调用的模型顺序
    pub fn candidate_models(&self) -> Vec<String> {
        if self.is_degraded() && !self.fallbacks.is_empty() {
            return self.fallbacks.clone();
        }
        std::iter::once(self.primary.clone())
            .chain(self.fallbacks.iter().cloned())
            .collect()
    }
}

/// 重试策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 同一模型的额外重试次数
    pub retries_per_model: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// 单次调用超时
    pub request_timeout: Duration,
    /// 整个尝试序列的总时限
    pub overall_budget: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries_per_model: constants::DEFAULT_RETRIES_PER_MODEL,
            base_delay: Duration::from_millis(constants::DEFAULT_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(constants::MAX_RETRY_DELAY_MS),
            request_timeout: constants::DEFAULT_REQUEST_TIMEOUT,
            overall_budget: constants::DEFAULT_OVERALL_BUDGET,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            retries_per_model: config.retries_per_model,
            base_delay: config.retry_delay(),
            max_delay: Duration::from_millis(constants::MAX_RETRY_DELAY_MS),
            request_timeout: config.request_timeout(),
            overall_budget: config.overall_budget(),
        }
    }

    /// 线性退避：base * (attempt + 1)，不超过上限
    pub fn backoff(&self, attempt: usize) -> Duration {
        self.base_delay
            .saturating_mul(attempt as u32 + 1)
            .min(self.max_delay)
    }
}

/// 带重试与回退的补全入口
pub struct ModelRouter {
    provider: Arc<dyn CompletionProvider>,
    selection: Arc<ProviderSelection>,
    policy: RetryPolicy,
}

impl ModelRouter {
    pub fn new(provider: Arc<dyn CompletionProvider>, selection: Arc<ProviderSelection>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            selection,
            policy,
        }
    }

    pub fn from_config(provider: Arc<dyn CompletionProvider>, config: &GateConfig) -> Self {
        Self::new(
            provider,
            Arc::new(ProviderSelection::from_config(config)),
            RetryPolicy::from_config(config),
        )
    }

    pub fn selection(&self) -> &Arc<ProviderSelection> {
        &self.selection
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn budget_exceeded(&self, started: Instant) -> GateError {
        metrics::counter!("content_gate_provider_budget_exhausted_total").increment(1);
        GateError::Timeout(format!(
            "补全调用超出总时限 {:?}（已用 {:?}）",
            self.policy.overall_budget,
            started.elapsed()
        ))
    }

    /// 执行一次补全：重试 → 回退 → 总时限
    pub async fn complete(&self, system: &str, user: &str) -> GateResult<String> {
        let started = Instant::now();
        let models = self.selection.candidate_models();
        let mut last_error: Option<ProviderError> = None;

        for model in &models {
            let request = CompletionRequest::new(system, user, model.as_str());
            let is_primary = model == self.selection.primary();

            for attempt in 0..=self.policy.retries_per_model {
                let elapsed = started.elapsed();
                if elapsed >= self.policy.overall_budget {
                    return Err(self.budget_exceeded(started));
                }
                let call_timeout = self.policy.request_timeout.min(self.policy.overall_budget - elapsed);

                metrics::counter!("content_gate_provider_calls_total", "model" => model.clone()).increment(1);
                let result = tokio::time::timeout(call_timeout, self.provider.complete(&request)).await;
                let error = match result {
                    Ok(Ok(text)) if !text.trim().is_empty() => {
                        tracing::debug!("模型 {} 第 {} 次尝试成功", model, attempt + 1);
                        return Ok(text);
                    }
                    Ok(Ok(_)) => ProviderError::empty_content(),
                    Ok(Err(error)) => error,
                    Err(_) => ProviderError::timeout(format!("模型 {} 调用超过 {:?}", model, call_timeout)),
                };

                metrics::counter!("content_gate_provider_failures_total", "kind" => error.kind.to_string())
                    .increment(1);
                tracing::warn!(
                    "模型 {} 调用失败 (尝试 {}/{}): {}",
                    model,
                    attempt + 1,
                    self.policy.retries_per_model + 1,
                    error
                );

                if error.kind.is_fatal() {
                    return Err(error.into());
                }
                let retryable = error.kind.is_retryable();
                last_error = Some(error);
                if !retryable {
                    break;
                }

                if attempt < self.policy.retries_per_model {
                    let remaining = self.policy.overall_budget.saturating_sub(started.elapsed());
                    let delay = self.policy.backoff(attempt);
                    if delay >= remaining {
                        return Err(self.budget_exceeded(started));
                    }
                    tokio::time::sleep(delay).await;
                }
            }

            if is_primary {
                self.selection.mark_degraded();
            }
            tracing::info!("切换到下一个模型（当前 {}）", model);
        }

        Err(last_error
            .map(GateError::from)
            .unwrap_or_else(|| GateError::ProviderRejection {
                kind: ProviderFailure::ModelUnavailable,
                message: "没有可用的模型".to_string(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    struct Scripted {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        calls: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for Scripted {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(request.model.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::new(ProviderFailure::Transport, "耗尽")))
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            retries_per_model: 1,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(1),
            overall_budget: Duration::from_secs(30),
        }
    }

    fn router(provider: Arc<Scripted>, policy: RetryPolicy) -> ModelRouter {
        let selection = ProviderSelection::new("main", vec!["backup".to_string()], Duration::from_secs(60));
        ModelRouter::new(provider, Arc::new(selection), policy)
    }

    #[test]
    fn test_backoff_is_linear_and_capped() {
        let p = policy();
        assert_eq!(p.backoff(0), Duration::from_millis(100));
        assert_eq!(p.backoff(2), Duration::from_millis(300));
        assert_eq!(p.backoff(9), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_retries_same_model() {
        let provider = Arc::new(Scripted::new(vec![
            Err(ProviderError::new(ProviderFailure::Transport, "503")),
            Ok("完成".to_string()),
        ]));
        let router = router(provider.clone(), policy());
        assert_eq!(router.complete("s", "u").await.unwrap(), "完成");
        assert_eq!(provider.calls(), vec!["main", "main"]);
        assert!(!router.selection().is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_authentication_failure_is_immediate() {
        let provider = Arc::new(Scripted::new(vec![Err(ProviderError::from_status(401, "bad key"))]));
        let router = router(provider.clone(), policy());
        let error = router.complete("s", "u").await.unwrap_err();
        assert!(matches!(
            error,
            GateError::ProviderRejection {
                kind: ProviderFailure::Authentication,
                ..
            }
        ));
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_model_falls_back_and_degrades_primary() {
        let provider = Arc::new(Scripted::new(vec![
            Err(ProviderError::from_status(404, "no such model")),
            Ok("備援".to_string()),
            Ok("第二次".to_string()),
        ]));
        let router = router(provider.clone(), policy());
        assert_eq!(router.complete("s", "u").await.unwrap(), "備援");
        assert!(router.selection().is_degraded());

        assert_eq!(router.complete("s", "u").await.unwrap(), "第二次");
        assert_eq!(provider.calls(), vec!["main", "backup", "backup"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_raises_timeout() {
        let mut scripted = Scripted::new(vec![Ok("太慢".to_string()); 4]);
        scripted.delay = Duration::from_secs(5);
        let provider = Arc::new(scripted);
        let router = router(provider.clone(), policy());
        let error = router.complete("s", "u").await.unwrap_err();
        assert!(matches!(error, GateError::Timeout(_)));
        assert_eq!(provider.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overall_budget_stops_mid_list() {
        let provider = Arc::new(Scripted::new(Vec::new()));
        let policy = RetryPolicy {
            retries_per_model: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(1),
            overall_budget: Duration::from_millis(3500),
        };
        let router = router(provider.clone(), policy);
        let error = router.complete("s", "u").await.unwrap_err();
        assert!(matches!(error, GateError::Timeout(_)));
        assert!(provider.calls().iter().all(|m| m == "main"));
        assert!(provider.calls().len() < 11);
    }
}
