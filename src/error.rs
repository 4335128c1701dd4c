//! 统一错误处理
//!
//! 校验器与评分器从不返回错误，只返回问题列表；只有编排器与外部协作者
//! （文本补全服务、存储、配置）会产生错误。编排器失败时总是携带完整的、
//! 可读的问题列表。

use std::fmt;

use thiserror::Error;

/// 文本补全服务的失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderFailure {
    /// 网络错误、5xx、429 或空内容，可在同一模型上重试
    Transport,
    /// 单次调用超时
    Timeout,
    /// 鉴权失败，任何模型都无法通过重试修复
    Authentication,
    /// 地区限制，任何模型都无法通过重试修复
    Region,
    /// 模型不可用，跳过该模型
    ModelUnavailable,
}

impl ProviderFailure {
    /// 能否在同一模型上重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderFailure::Transport | ProviderFailure::Timeout)
    }

    /// 是否对所有模型都无法修复（应立即失败）
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderFailure::Authentication | ProviderFailure::Region)
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderFailure::Transport => "transport",
            ProviderFailure::Timeout => "timeout",
            ProviderFailure::Authentication => "authentication",
            ProviderFailure::Region => "region",
            ProviderFailure::ModelUnavailable => "model_unavailable",
        };
        f.write_str(name)
    }
}

/// 单次补全调用的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("补全调用失败 ({kind}): {message}")]
pub struct ProviderError {
    pub kind: ProviderFailure,
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// 根据 HTTP 状态码与响应内容分类
    pub fn from_status(status: u16, body: &str) -> Self {
        let lower = body.to_lowercase();
        let kind = match status {
            401 => ProviderFailure::Authentication,
            403 | 451 => ProviderFailure::Region,
            404 => ProviderFailure::ModelUnavailable,
            400 if lower.contains("model") && (lower.contains("not found") || lower.contains("does not exist")) => {
                ProviderFailure::ModelUnavailable
            }
            _ => ProviderFailure::Transport,
        };
        let snippet: String = body.chars().take(200).collect();
        Self {
            kind,
            status: Some(status),
            message: format!("HTTP {}: {}", status, snippet),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderFailure::Timeout, message)
    }

    pub fn empty_content() -> Self {
        Self::new(ProviderFailure::Transport, "补全内容为空")
    }
}

/// 质量闸门错误类型
#[derive(Error, Debug, Clone)]
pub enum GateError {
    /// 传输错误（网络、超时以外的可重试失败）
    #[error("传输错误: {0}")]
    Transport(String),

    /// 超时错误（单次调用或整体预算）
    #[error("操作超时: {0}")]
    Timeout(String),

    /// 服务拒绝（鉴权、地区、模型不可用）
    #[error("服务拒绝 ({kind}): {message}")]
    ProviderRejection { kind: ProviderFailure, message: String },

    /// 硬性校验未通过
    #[error("校验未通过 ({} 项): {}", .issues.len(), .issues.join("; "))]
    Validation { issues: Vec<String> },

    /// 双语一致性修复失败
    #[error("双语一致性失败 ({} 项): {}", .issues.len(), .issues.join("; "))]
    Consistency { issues: Vec<String> },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 存储错误
    #[error("存储错误: {0}")]
    Storage(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl GateError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            GateError::Transport(_) => true,
            GateError::Timeout(_) => true,
            GateError::ProviderRejection { kind, .. } => kind.is_retryable(),
            GateError::Validation { .. } => false,
            GateError::Consistency { .. } => false,
            GateError::Config(_) => false,
            GateError::Storage(_) => false,
            GateError::Parse(_) => false,
            GateError::Internal(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GateError::Transport(_) => ErrorSeverity::Warning,
            GateError::Timeout(_) => ErrorSeverity::Warning,
            GateError::ProviderRejection { kind, .. } if kind.is_fatal() => ErrorSeverity::Critical,
            GateError::ProviderRejection { .. } => ErrorSeverity::Error,
            GateError::Validation { .. } => ErrorSeverity::Error,
            GateError::Consistency { .. } => ErrorSeverity::Error,
            GateError::Config(_) => ErrorSeverity::Critical,
            GateError::Storage(_) => ErrorSeverity::Error,
            GateError::Parse(_) => ErrorSeverity::Error,
            GateError::Internal(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            GateError::Transport(_) => ErrorCategory::Network,
            GateError::Timeout(_) => ErrorCategory::Timeout,
            GateError::ProviderRejection { .. } => ErrorCategory::Service,
            GateError::Validation { .. } => ErrorCategory::Validation,
            GateError::Consistency { .. } => ErrorCategory::Validation,
            GateError::Config(_) => ErrorCategory::Configuration,
            GateError::Storage(_) => ErrorCategory::Storage,
            GateError::Parse(_) => ErrorCategory::Parsing,
            GateError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// 校验/一致性失败时的问题列表
    pub fn issues(&self) -> &[String] {
        match self {
            GateError::Validation { issues } | GateError::Consistency { issues } => issues,
            _ => &[],
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Service,
    Timeout,
    Validation,
    Storage,
    Parsing,
    Internal,
}

impl From<ProviderError> for GateError {
    fn from(error: ProviderError) -> Self {
        match error.kind {
            ProviderFailure::Transport => GateError::Transport(error.message),
            ProviderFailure::Timeout => GateError::Timeout(error.message),
            kind => GateError::ProviderRejection {
                kind,
                message: error.message,
            },
        }
    }
}

impl From<std::io::Error> for GateError {
    fn from(error: std::io::Error) -> Self {
        GateError::Storage(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for GateError {
    fn from(error: serde_json::Error) -> Self {
        GateError::Parse(format!("JSON序列化错误: {}", error))
    }
}

impl From<config::ConfigError> for GateError {
    fn from(error: config::ConfigError) -> Self {
        GateError::Config(error.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for GateError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        GateError::Timeout(format!("异步操作超时: {}", error))
    }
}

/// 错误结果类型别名
pub type GateResult<T> = Result<T, GateError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录并返回错误
    pub fn log_error<T>(error: GateError) -> GateResult<T> {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("闸门信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("闸门警告: {}", error),
            ErrorSeverity::Error => tracing::error!("闸门错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("闸门严重错误: {}", error),
        }

        Err(error)
    }

    /// 由问题列表创建校验错误
    pub fn validation_error<I, S>(issues: I) -> GateError
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        GateError::Validation {
            issues: issues.into_iter().map(|i| i.to_string()).collect(),
        }
    }
}
