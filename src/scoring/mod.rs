//! 评分引擎
//!
//! - `seo` - SEO/GEO 规则评分
//! - `extractability` - 搜索可提取性评分
//! - `actions` - AI 改进动作完成度
//!
//! 评分器与校验器一样从不返回错误。闸门模式决定分数不足时是阻止定稿（hard）
//! 还是仅写入报告（soft）。

pub mod actions;
pub mod extractability;
pub mod seo;

use crate::analysis::structure::StructureSignals;
use crate::config::{EvidenceMode, GateConfig, GateMode, PlatformProfile};
use crate::model::{ContentDraft, IssueRule, QualityReport, ValidationIssue};

pub use actions::score_actions;
pub use extractability::{score_extractability, ExtractabilityScore};
pub use seo::{score_seo_geo, SeoGeoScore};

/// 评分所需的上下文
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringContext {
    pub keyword: String,
    pub required_faq_pairs: usize,
    pub seo_threshold: u32,
    pub geo_threshold: u32,
    pub extractability_threshold: u32,
    pub seo_gate: GateMode,
    pub extractability_gate: GateMode,
    pub evidence_mode: EvidenceMode,
    pub reference_year: i32,
}

impl ScoringContext {
    pub fn new(config: &GateConfig, keyword: &str, profile: &PlatformProfile, reference_year: i32) -> Self {
        Self {
            keyword: keyword.to_string(),
            required_faq_pairs: profile.required_faq_pairs,
            seo_threshold: config.seo_threshold,
            geo_threshold: config.geo_threshold,
            extractability_threshold: config.extractability_threshold,
            seo_gate: config.seo_gate,
            extractability_gate: config.extractability_gate,
            evidence_mode: config.evidence_mode,
            reference_year,
        }
    }
}

/// 一次完整评分
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub seo_geo: SeoGeoScore,
    pub extractability: ExtractabilityScore,
    pub signals: StructureSignals,
}

impl ScoreCard {
    pub fn seo_shortfall(&self, ctx: &ScoringContext) -> u32 {
        ctx.seo_threshold.saturating_sub(self.seo_geo.seo)
    }

    pub fn geo_shortfall(&self, ctx: &ScoringContext) -> u32 {
        ctx.geo_threshold.saturating_sub(self.seo_geo.geo)
    }

    pub fn extractability_shortfall(&self, ctx: &ScoringContext) -> u32 {
        ctx.extractability_threshold
            .saturating_sub(self.extractability.score)
    }

    /// 分数闸门产生的问题：闸门为 hard 时为硬性问题
    pub fn gate_issues(&self, ctx: &ScoringContext) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut push = |mode: GateMode, message: String| {
            issues.push(match mode {
                GateMode::Hard => ValidationIssue::hard(IssueRule::ScoreGate, message),
                GateMode::Soft => ValidationIssue::soft(IssueRule::ScoreGate, message),
            });
        };

        if self.seo_shortfall(ctx) > 0 {
            push(ctx.seo_gate, format!("SEO 分数 {} 低于门槛 {}", self.seo_geo.seo, ctx.seo_threshold));
        }
        if self.geo_shortfall(ctx) > 0 {
            push(ctx.seo_gate, format!("GEO 分数 {} 低于门槛 {}", self.seo_geo.geo, ctx.geo_threshold));
        }
        if self.extractability_shortfall(ctx) > 0 {
            push(
                ctx.extractability_gate,
                format!(
                    "可提取性分数 {} 低于门槛 {}",
                    self.extractability.score, ctx.extractability_threshold
                ),
            );
        }
        issues
    }

    /// 所有 hard 闸门均达标
    pub fn passed(&self, ctx: &ScoringContext) -> bool {
        self.gate_issues(ctx).iter().all(|issue| !issue.is_hard())
    }

    pub fn to_report(&self, ctx: &ScoringContext) -> QualityReport {
        let mut issues = self.seo_geo.issues.clone();
        issues.extend(self.extractability.issues.iter().cloned());
        let mut strengths = self.seo_geo.strengths.clone();
        strengths.extend(self.extractability.strengths.iter().cloned());

        QualityReport {
            seo_score: self.seo_geo.seo,
            geo_score: self.seo_geo.geo,
            extractability_score: self.extractability.score,
            passed: self.passed(ctx),
            issues,
            strengths,
            signals: self.signals.clone(),
        }
    }
}

/// 对草稿做完整评分
pub fn score(draft: &ContentDraft, ctx: &ScoringContext) -> ScoreCard {
    ScoreCard {
        seo_geo: score_seo_geo(
            draft,
            &ctx.keyword,
            ctx.required_faq_pairs,
            ctx.seo_threshold,
            ctx.geo_threshold,
        ),
        extractability: score_extractability(draft, ctx.reference_year, ctx.evidence_mode),
        signals: StructureSignals::analyze(&draft.body),
    }
}
