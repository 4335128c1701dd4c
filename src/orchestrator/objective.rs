//! 候选选择的目标函数
//!
//! AI 修订不保证单调改进，所以每一轮都计算一个标量距离，最后在全部候选中取最小者。
//! 距离越小越好：分数缺口的加权和，加上每个未解决问题的惩罚。

use crate::config::{constants, GateMode};
use crate::model::{RevisionRound, ValidationIssue};
use crate::scoring::{ScoreCard, ScoringContext};

/// 目标函数接口，便于在测试中替换权重
pub trait Objective: Send + Sync {
    fn distance(&self, card: &ScoreCard, issues: &[ValidationIssue], ctx: &ScoringContext) -> f64;
}

/// 默认的加权距离
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedDistance {
    pub seo_weight: f64,
    pub geo_weight: f64,
    /// 可提取性闸门为 soft 时的权重
    pub extractability_soft_weight: f64,
    /// 可提取性闸门为 hard 时的权重
    pub extractability_hard_weight: f64,
    pub hard_issue_penalty: f64,
    pub soft_issue_penalty: f64,
}

impl Default for WeightedDistance {
    fn default() -> Self {
        Self {
            seo_weight: 1.0,
            geo_weight: 1.0,
            extractability_soft_weight: 0.5,
            extractability_hard_weight: 1.0,
            hard_issue_penalty: constants::HARD_ISSUE_DISTANCE,
            soft_issue_penalty: constants::SOFT_ISSUE_DISTANCE,
        }
    }
}

impl Objective for WeightedDistance {
    fn distance(&self, card: &ScoreCard, issues: &[ValidationIssue], ctx: &ScoringContext) -> f64 {
        let extractability_weight = match ctx.extractability_gate {
            GateMode::Hard => self.extractability_hard_weight,
            GateMode::Soft => self.extractability_soft_weight,
        };
        let hard = issues.iter().filter(|i| i.is_hard()).count() as f64;
        let soft = issues.len() as f64 - hard;

        card.seo_shortfall(ctx) as f64 * self.seo_weight
            + card.geo_shortfall(ctx) as f64 * self.geo_weight
            + card.extractability_shortfall(ctx) as f64 * extractability_weight
            + hard * self.hard_issue_penalty
            + soft * self.soft_issue_penalty
    }
}

/// 选出距离最小的候选；距离相同时取较早的一轮
pub fn select_best(rounds: &[RevisionRound]) -> Option<&RevisionRound> {
    rounds.iter().fold(None, |best: Option<&RevisionRound>, round| match best {
        Some(current) if current.distance <= round.distance => Some(current),
        _ => Some(round),
    })
}
