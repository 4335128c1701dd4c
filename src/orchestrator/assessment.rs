//! 一次完整评估：规则校验 + 分数闸门 + 距离

use super::objective::Objective;
use crate::bilingual::BilingualConsistency;
use crate::config::GateConfig;
use crate::model::{ContentDraft, GenerationRequest, ValidationIssue};
use crate::repair::RepairContext;
use crate::scoring::{score, ScoreCard, ScoringContext};
use crate::storage::StoreKey;
use crate::validators::{ValidationContext, Validator, ValidatorSuite};

/// 单条流水线所需的只读上下文
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub key: StoreKey,
    pub validation: ValidationContext,
    pub repair: RepairContext,
    pub scoring: ScoringContext,
}

impl PipelineContext {
    pub fn new(config: &GateConfig, request: &GenerationRequest) -> Self {
        let year = config.effective_reference_year();
        let validation = ValidationContext::for_request(request, year);
        let scoring = ScoringContext::new(config, &request.keyword, &validation.profile, year);
        Self {
            key: StoreKey::for_request(request),
            validation,
            repair: RepairContext::for_request(request, year),
            scoring,
        }
    }
}

/// 评估结果
#[derive(Debug, Clone)]
pub struct Assessment {
    /// 规则校验器发现的问题
    pub issues: Vec<ValidationIssue>,
    /// 分数闸门问题
    pub gate_issues: Vec<ValidationIssue>,
    pub card: ScoreCard,
    pub distance: f64,
}

impl Assessment {
    pub fn hard_count(&self) -> usize {
        self.issues
            .iter()
            .chain(self.gate_issues.iter())
            .filter(|issue| issue.is_hard())
            .count()
    }

    pub fn all_issues(&self) -> Vec<ValidationIssue> {
        self.issues.iter().chain(self.gate_issues.iter()).cloned().collect()
    }

    pub fn hard_issues(&self) -> Vec<ValidationIssue> {
        self.all_issues().into_iter().filter(|i| i.is_hard()).collect()
    }

    pub fn extractability(&self) -> u32 {
        self.card.extractability.score
    }
}

/// 评估草稿；`bilingual` 为 true 时同时检查双语一致性（定稿阶段）
pub fn assess(
    draft: &ContentDraft,
    ctx: &PipelineContext,
    suite: &ValidatorSuite,
    objective: &dyn Objective,
    bilingual: bool,
) -> Assessment {
    let mut issues = suite.validate(draft, &ctx.validation);
    if bilingual {
        issues.extend(BilingualConsistency.validate(draft, &ctx.validation));
    }
    let card = score(draft, &ctx.scoring);
    let gate_issues = card.gate_issues(&ctx.scoring);
    let distance = objective.distance(&card, &issues, &ctx.scoring);

    Assessment {
        issues,
        gate_issues,
        card,
        distance,
    }
}
