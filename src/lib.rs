//! # Content Gate Library
//!
//! 迭代式内容质量闸门：把一份由文本补全服务生成的原始草稿，经过有限轮次的
//! AI 修订与确定性修复，变成满足结构、语言、链接策略与评分约束的定稿文章。
//!
//! ## 模块组织
//!
//! - `analysis` - 文本切分、相似度去重与结构信号分析（纯函数）
//! - `validators` - 固定规则校验器，只返回问题列表
//! - `scoring` - SEO/GEO、可提取性与 AI 动作完成度评分
//! - `repair` - 不依赖补全服务的幂等修复变换
//! - `bilingual` - 双语一致性校验与逐级修复阶梯
//! - `provider` - 文本补全服务接口、HTTP 实现与模型路由
//! - `orchestrator` - 生成状态机与候选选择
//! - `storage` - 写一次的内容存储
//! - `config` / `env` / `error` / `logging` - 配置、环境变量、错误与日志

pub mod analysis;
pub mod bilingual;
pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod repair;
pub mod scoring;
pub mod storage;
pub mod validators;

// Re-export commonly used items for convenience
pub use config::{ConfigManager, GateConfig, PlatformProfile};
pub use error::{GateError, GateResult, ProviderError, ProviderFailure};
pub use model::{
    AiActionReport, ArticleType, ContentDraft, ContentVariant, GenerationRequest, IssueRule,
    IssueSeverity, LinkPolicyContext, Platform, QualityReport, RevisionRound, ValidationIssue,
};
pub use orchestrator::{Orchestrator, PipelineState};
pub use provider::{CompletionProvider, HttpCompletionProvider, ModelRouter};
pub use storage::{ContentStore, FileStore, MemoryStore, StoreKey};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
