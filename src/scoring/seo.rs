//! SEO / GEO 规则评分
//!
//! 两个独立的 0–100 分数，从 100 起按缺失信号扣固定分。

use serde::{Deserialize, Serialize};

use crate::analysis::structure::StructureSignals;
use crate::analysis::text::lead_paragraph;
use crate::analysis::structure::extract_headings;
use crate::config::constants;
use crate::model::ContentDraft;

// SEO 扣分
const SEO_KEYWORD_IN_TITLE: u32 = 25;
const SEO_KEYWORD_IN_INTRO: u32 = 15;
const SEO_FEW_HEADINGS: u32 = 15;
const SEO_KEYWORD_IN_HEADINGS: u32 = 10;
const SEO_FAQ_BELOW_REQUIREMENT: u32 = 15;
const SEO_LONG_TITLE: u32 = 5;

// GEO 扣分
const GEO_NO_DEFINITION: u32 = 20;
const GEO_NO_EVIDENCE: u32 = 20;
const GEO_FAQ_BELOW_REQUIREMENT: u32 = 20;
const GEO_FEW_HEADINGS: u32 = 15;
const GEO_NO_ANSWER_FIRST: u32 = 15;
const GEO_NO_LIST_OR_TABLE: u32 = 10;

const MIN_STRUCTURED_HEADINGS: usize = 3;

/// SEO/GEO 评分结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoGeoScore {
    pub seo: u32,
    pub geo: u32,
    pub passed: bool,
    pub issues: Vec<String>,
    pub strengths: Vec<String>,
}

fn contains_keyword(text: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    keyword.is_empty() || text.to_lowercase().contains(&keyword.to_lowercase())
}

struct Tally {
    score: u32,
    issues: Vec<String>,
    strengths: Vec<String>,
}

impl Tally {
    fn new() -> Self {
        Self {
            score: 100,
            issues: Vec::new(),
            strengths: Vec::new(),
        }
    }

    fn check(&mut self, ok: bool, penalty: u32, issue: impl Into<String>, strength: impl Into<String>) {
        if ok {
            self.strengths.push(strength.into());
        } else {
            self.score = self.score.saturating_sub(penalty);
            self.issues.push(issue.into());
        }
    }
}

/// 计算 SEO 与 GEO 分数
pub fn score_seo_geo(
    draft: &ContentDraft,
    keyword: &str,
    required_faq_pairs: usize,
    seo_threshold: u32,
    geo_threshold: u32,
) -> SeoGeoScore {
    let signals = StructureSignals::analyze(&draft.body);
    let headings = extract_headings(&draft.body);
    let intro = lead_paragraph(&draft.body).unwrap_or_default();
    let faq_ok = signals.faq_pairs >= required_faq_pairs;
    let enough_headings = signals.heading_count >= MIN_STRUCTURED_HEADINGS;

    let mut seo = Tally::new();
    seo.check(
        contains_keyword(&draft.title, keyword),
        SEO_KEYWORD_IN_TITLE,
        "SEO: 标题缺少关键词",
        "SEO: 标题包含关键词",
    );
    seo.check(
        contains_keyword(&intro, keyword),
        SEO_KEYWORD_IN_INTRO,
        "SEO: 导语缺少关键词",
        "SEO: 导语包含关键词",
    );
    if enough_headings {
        seo.check(
            headings.iter().any(|h| contains_keyword(&h.text, keyword)),
            SEO_KEYWORD_IN_HEADINGS,
            "SEO: 小标题均未包含关键词",
            "SEO: 小标题包含关键词",
        );
    } else {
        seo.check(
            false,
            SEO_FEW_HEADINGS,
            format!("SEO: 小标题不足 {} 个（{}）", MIN_STRUCTURED_HEADINGS, signals.heading_count),
            "",
        );
    }
    seo.check(
        faq_ok,
        SEO_FAQ_BELOW_REQUIREMENT,
        format!("SEO: FAQ {} 组，低于要求 {}", signals.faq_pairs, required_faq_pairs),
        "SEO: FAQ 数量达标",
    );
    seo.check(
        draft.seo_title.chars().count() <= constants::MAX_SEO_TITLE_CHARS,
        SEO_LONG_TITLE,
        format!("SEO: 搜索标题超过 {} 字", constants::MAX_SEO_TITLE_CHARS),
        "SEO: 搜索标题长度合适",
    );

    let mut geo = Tally::new();
    geo.check(signals.has_definition, GEO_NO_DEFINITION, "GEO: 缺少定义段落", "GEO: 有定义段落");
    geo.check(
        signals.evidence_sentences > 0,
        GEO_NO_EVIDENCE,
        "GEO: 缺少数据引用",
        "GEO: 有数据引用",
    );
    geo.check(
        faq_ok,
        GEO_FAQ_BELOW_REQUIREMENT,
        "GEO: FAQ 数量不足",
        "GEO: FAQ 数量达标",
    );
    geo.check(enough_headings, GEO_FEW_HEADINGS, "GEO: 结构化小标题不足", "GEO: 结构化小标题充足");
    geo.check(signals.answer_first, GEO_NO_ANSWER_FIRST, "GEO: 导语没有先给答案", "GEO: 导语先给答案");
    geo.check(
        signals.has_list_or_table(),
        GEO_NO_LIST_OR_TABLE,
        "GEO: 缺少列表或表格",
        "GEO: 有列表或表格",
    );

    let passed = seo.score >= seo_threshold && geo.score >= geo_threshold;

    let mut issues = seo.issues;
    issues.extend(geo.issues);
    let mut strengths = seo.strengths;
    strengths.extend(geo.strengths);
    strengths.retain(|s| !s.is_empty());

    SeoGeoScore {
        seo: seo.score,
        geo: geo.score,
        passed,
        issues,
        strengths,
    }
}
