//! 规则校验器
//!
//! 固定的小型规则目录。每个校验器都是 `(草稿, 上下文) -> 问题列表` 的纯函数，
//! 从不返回错误，也不修改草稿。

pub mod article_type;
pub mod depth;
pub mod freshness;
pub mod language;
pub mod links;
pub mod platform;

use crate::config::PlatformProfile;
use crate::model::{ArticleType, ContentDraft, GenerationRequest, LinkPolicyContext, ValidationIssue};

pub use article_type::ArticleTypeStructure;
pub use depth::StructuralDepth;
pub use freshness::Freshness;
pub use language::LanguagePurity;
pub use links::LinkPolicy;
pub use platform::{PlatformCompliance, PlatformSafety};

/// 校验上下文：在校验器之间只读传递
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationContext {
    pub link_policy: LinkPolicyContext,
    pub profile: PlatformProfile,
    pub article_type: ArticleType,
    pub reference_year: i32,
}

impl ValidationContext {
    pub fn new(link_policy: LinkPolicyContext, article_type: ArticleType, reference_year: i32) -> Self {
        let profile = PlatformProfile::for_platform(link_policy.platform);
        Self {
            link_policy,
            profile,
            article_type,
            reference_year,
        }
    }

    pub fn for_request(request: &GenerationRequest, reference_year: i32) -> Self {
        Self::new(request.link_context(), request.article_type, reference_year)
    }
}

/// 校验器接口
pub trait Validator: Send + Sync {
    /// 规则名称（日志用）
    fn name(&self) -> &'static str;

    fn validate(&self, draft: &ContentDraft, ctx: &ValidationContext) -> Vec<ValidationIssue>;
}

/// 校验器集合
pub struct ValidatorSuite {
    validators: Vec<Box<dyn Validator>>,
}

impl Default for ValidatorSuite {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorSuite {
    /// 完整的规则目录（含平台安全用语检查）
    pub fn new() -> Self {
        Self {
            validators: vec![
                Box::new(LanguagePurity),
                Box::new(LinkPolicy),
                Box::new(Freshness),
                Box::new(StructuralDepth),
                Box::new(PlatformCompliance),
                Box::new(PlatformSafety),
                Box::new(ArticleTypeStructure),
            ],
        }
    }

    /// 依次运行全部校验器并汇总问题
    pub fn validate(&self, draft: &ContentDraft, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for validator in &self.validators {
            let found = validator.validate(draft, ctx);
            if !found.is_empty() {
                tracing::debug!("校验器 {} 发现 {} 个问题", validator.name(), found.len());
            }
            issues.extend(found);
        }
        issues
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

/// 筛出硬性问题
pub fn hard_issues(issues: &[ValidationIssue]) -> Vec<&ValidationIssue> {
    issues.iter().filter(|issue| issue.is_hard()).collect()
}

/// 问题列表转为可读文本列表
pub fn describe(issues: &[ValidationIssue]) -> Vec<String> {
    issues.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentVariant, Platform};

    #[test]
    fn test_suite_runs_full_catalog() {
        assert_eq!(ValidatorSuite::new().len(), 7);
    }

    #[test]
    fn test_context_resolves_platform_profile() {
        let ctx = ValidationContext::new(
            LinkPolicyContext::new(Platform::Medium, ContentVariant::Default),
            ArticleType::General,
            2026,
        );
        assert_eq!(ctx.profile.platform, Platform::Medium);
        assert_eq!(ctx.profile.required_faq_pairs, 2);
    }
}
