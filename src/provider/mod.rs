//! 文本补全服务
//!
//! 编排器只依赖 [`CompletionProvider`] 这一契约：
//! `(system, user, model) -> completion text`。失败分为 HTTP 状态、超时与空内容三类，
//! 由 [`ProviderError`] 携带失败类别。
//!
//! - `http` - OpenAI 兼容的 `/chat/completions` 实现
//! - `router` - 模型选择、重试、回退与总时限

pub mod http;
pub mod router;

use async_trait::async_trait;

use crate::error::ProviderError;

pub use http::HttpCompletionProvider;
pub use router::{ModelRouter, ProviderSelection, RetryPolicy};

/// 一次补全请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub model: String,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            model: model.into(),
        }
    }
}

/// 文本补全服务接口
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// 返回补全文本；空内容应作为错误返回
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// 服务名称（日志用）
    fn name(&self) -> &str {
        "completion"
    }
}
