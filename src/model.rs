//! 核心数据模型
//!
//! 草稿、校验问题、质量报告、AI 动作报告、修订轮次与链接策略上下文。

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::structure::StructureSignals;

/// 发布平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Blog,
    Medium,
    Linkedin,
    Facebook,
    Vocus,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Blog,
        Platform::Medium,
        Platform::Linkedin,
        Platform::Facebook,
        Platform::Vocus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Blog => "blog",
            Platform::Medium => "medium",
            Platform::Linkedin => "linkedin",
            Platform::Facebook => "facebook",
            Platform::Vocus => "vocus",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lower = value.trim().to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| format!("未知平台 '{}'", value))
    }
}

/// 内容变体：同一排期位置的另一种生成模式，存储与校验上与默认模式隔离
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentVariant {
    #[default]
    Default,
    Campaign,
}

impl ContentVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentVariant::Default => "default",
            ContentVariant::Campaign => "campaign",
        }
    }
}

impl fmt::Display for ContentVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "default" => Ok(ContentVariant::Default),
            "campaign" => Ok(ContentVariant::Campaign),
            other => Err(format!("未知内容变体 '{}'", other)),
        }
    }
}

/// 文章类型（内容原型）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArticleType {
    HowTo,
    Ranking,
    TrendAnalysis,
    CaseReview,
    Comparison,
    PracticalGuide,
    #[default]
    General,
}

impl ArticleType {
    pub const ALL: [ArticleType; 7] = [
        ArticleType::HowTo,
        ArticleType::Ranking,
        ArticleType::TrendAnalysis,
        ArticleType::CaseReview,
        ArticleType::Comparison,
        ArticleType::PracticalGuide,
        ArticleType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::HowTo => "how-to",
            ArticleType::Ranking => "ranking",
            ArticleType::TrendAnalysis => "trend-analysis",
            ArticleType::CaseReview => "case-review",
            ArticleType::Comparison => "comparison",
            ArticleType::PracticalGuide => "practical-guide",
            ArticleType::General => "general",
        }
    }
}

impl fmt::Display for ArticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lower = value.trim().to_lowercase().replace('_', "-");
        ArticleType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("未知文章类型 '{}'", value))
    }
}

/// 内容草稿
///
/// 由文本补全结果解析而来，在「校验 → 修复」循环中原地修改，持久化后不再变动。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDraft {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub body_en: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub image_prompt: String,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub cta_url: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_actions: Option<AiActionReport>,
}

/// 补全结果中的 JSON 载荷
#[derive(Debug, Default, Deserialize)]
struct CompletionPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    title_en: String,
    #[serde(default)]
    body_en: String,
    #[serde(default)]
    hashtags: Vec<String>,
    #[serde(default)]
    image_prompt: String,
    #[serde(default)]
    seo_title: String,
}

/// 去掉 ``` 代码围栏
pub(crate) fn strip_code_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 截取最外层 JSON 对象
pub(crate) fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

impl ContentDraft {
    /// 从补全文本创建草稿
    ///
    /// 优先按 JSON 解析；失败时退化为「第一行标题 + 其余正文」，
    /// 这种情况下残留的序列化键会在语言纯度校验中被标记出来。
    pub fn from_completion(raw: &str, cta_url: &str) -> Self {
        let cleaned = strip_code_fences(raw);

        let parsed = extract_json_object(&cleaned)
            .and_then(|json| serde_json::from_str::<CompletionPayload>(json).ok());

        let mut draft = match parsed {
            Some(payload) if !payload.body.trim().is_empty() => Self {
                title: payload.title.trim().to_string(),
                body: payload.body.trim().to_string(),
                title_en: payload.title_en.trim().to_string(),
                body_en: payload.body_en.trim().to_string(),
                hashtags: payload.hashtags,
                image_prompt: payload.image_prompt.trim().to_string(),
                seo_title: payload.seo_title.trim().to_string(),
                ..Default::default()
            },
            _ => {
                tracing::warn!("补全结果不是有效的 JSON，按纯文本解析");
                let mut lines = cleaned.lines().skip_while(|l| l.trim().is_empty());
                let title = lines
                    .next()
                    .unwrap_or_default()
                    .trim_start_matches('#')
                    .trim()
                    .to_string();
                let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
                Self {
                    title,
                    body,
                    ..Default::default()
                }
            }
        };

        draft.cta_url = cta_url.to_string();
        draft
    }

    /// 是否带有双语版本
    pub fn has_secondary(&self) -> bool {
        !self.body_en.trim().is_empty()
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }
}

/// 问题严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Soft,
    Hard,
}

/// 产生问题的规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueRule {
    LanguagePurity,
    LinkPolicy,
    Freshness,
    StructuralDepth,
    PlatformCompliance,
    FaqSufficiency,
    ArticleTypeStructure,
    PlatformSafety,
    BilingualConsistency,
    ScoreGate,
}

impl IssueRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueRule::LanguagePurity => "language_purity",
            IssueRule::LinkPolicy => "link_policy",
            IssueRule::Freshness => "freshness",
            IssueRule::StructuralDepth => "structural_depth",
            IssueRule::PlatformCompliance => "platform_compliance",
            IssueRule::FaqSufficiency => "faq_sufficiency",
            IssueRule::ArticleTypeStructure => "article_type_structure",
            IssueRule::PlatformSafety => "platform_safety",
            IssueRule::BilingualConsistency => "bilingual_consistency",
            IssueRule::ScoreGate => "score_gate",
        }
    }
}

/// 校验问题（临时对象，不持久化）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub rule: IssueRule,
    pub severity: IssueSeverity,
    pub message: String,
}

impl ValidationIssue {
    pub fn hard(rule: IssueRule, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: IssueSeverity::Hard,
            message: message.into(),
        }
    }

    pub fn soft(rule: IssueRule, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: IssueSeverity::Soft,
            message: message.into(),
        }
    }

    pub fn is_hard(&self) -> bool {
        self.severity == IssueSeverity::Hard
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule.as_str(), self.message)
    }
}

/// 质量报告，定稿时附加到草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub seo_score: u32,
    pub geo_score: u32,
    pub extractability_score: u32,
    pub passed: bool,
    pub issues: Vec<String>,
    pub strengths: Vec<String>,
    pub signals: StructureSignals,
}

/// AI 改进动作完成度报告
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiActionReport {
    pub required: Vec<String>,
    pub completed: Vec<String>,
    pub unresolved: Vec<String>,
    /// 0–100 的完成比例
    pub completion: u32,
}

/// 修订轮次：仅用于在有限轮次中挑选全局最优候选
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionRound {
    pub index: usize,
    pub candidate: ContentDraft,
    pub distance: f64,
    pub hard_issues: usize,
}

/// 链接策略上下文：在校验器之间传递，不会被修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPolicyContext {
    pub platform: Platform,
    pub secondary_allow_list: Vec<String>,
    pub variant: ContentVariant,
}

impl LinkPolicyContext {
    pub fn new(platform: Platform, variant: ContentVariant) -> Self {
        Self {
            platform,
            secondary_allow_list: Vec::new(),
            variant,
        }
    }

    pub fn with_allow_list<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_allow_list = domains.into_iter().map(Into::into).collect();
        self
    }
}

/// 一次生成请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub keyword: String,
    pub platform: Platform,
    #[serde(default)]
    pub variant: ContentVariant,
    #[serde(default)]
    pub article_type: ArticleType,
    pub cta_url: String,
    #[serde(default)]
    pub secondary_allow_list: Vec<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub improvement_actions: Vec<String>,
}

impl GenerationRequest {
    pub fn link_context(&self) -> LinkPolicyContext {
        LinkPolicyContext::new(self.platform, self.variant)
            .with_allow_list(self.secondary_allow_list.iter().cloned())
    }
}
