//! 搜索可提取性评分
//!
//! 衡量内容被搜索引擎或问答系统直接摘录的难易程度。

use serde::{Deserialize, Serialize};

use crate::analysis::structure::StructureSignals;
use crate::config::EvidenceMode;
use crate::model::ContentDraft;
use crate::validators::freshness::stale_years_outside_citation;

const NO_ANSWER_FIRST: u32 = 20;
const NO_EVIDENCE: u32 = 15;
const FEW_QUOTABLE: u32 = 15;
const NO_DEFINITION: u32 = 15;
const STALE_YEAR: u32 = 10;
const OVERCLAIM: u32 = 10;
const POOR_STRUCTURE: u32 = 15;

const MIN_QUOTABLE_SENTENCES: usize = 3;
const MIN_EXTRACTABLE_HEADINGS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractabilityScore {
    pub score: u32,
    pub issues: Vec<String>,
    pub strengths: Vec<String>,
}

pub fn score_extractability(
    draft: &ContentDraft,
    reference_year: i32,
    evidence_mode: EvidenceMode,
) -> ExtractabilityScore {
    let signals = StructureSignals::analyze(&draft.body);
    let mut score: u32 = 100;
    let mut issues = Vec::new();
    let mut strengths = Vec::new();

    let mut deduct = |ok: bool, penalty: u32, issue: &str, strength: &str| {
        if ok {
            strengths.push(format!("可提取性: {}", strength));
        } else {
            score = score.saturating_sub(penalty);
            issues.push(format!("可提取性: {}", issue));
        }
    };

    deduct(signals.answer_first, NO_ANSWER_FIRST, "导语没有先给答案", "导语先给答案");
    if evidence_mode == EvidenceMode::Auto {
        deduct(signals.evidence_sentences > 0, NO_EVIDENCE, "缺少证据句", "有证据句");
    }
    deduct(
        signals.quotable_sentences >= MIN_QUOTABLE_SENTENCES,
        FEW_QUOTABLE,
        "可独立引用的短句不足 3 句",
        "可独立引用的短句充足",
    );
    deduct(signals.has_definition, NO_DEFINITION, "缺少定义句", "有定义句");
    deduct(
        stale_years_outside_citation(&draft.body, reference_year).is_empty(),
        STALE_YEAR,
        "存在缺少引用语境的过时年份",
        "年份信息新鲜",
    );
    deduct(!signals.has_overclaim, OVERCLAIM, "存在夸大宣称", "没有夸大宣称");
    deduct(
        signals.has_list_or_table() || signals.heading_count >= MIN_EXTRACTABLE_HEADINGS,
        POOR_STRUCTURE,
        "缺少列表、表格或小标题",
        "结构便于摘录",
    );

    ExtractabilityScore {
        score,
        issues,
        strengths,
    }
}
