//! 文章类型结构校验
//!
//! 每种内容原型声明自己需要的结构信号（步骤数、具名章节、来源与年份）。

use std::sync::OnceLock;

use regex::Regex;

use super::freshness::has_citation_keyword;
use super::{ValidationContext, Validator};
use crate::analysis::structure::{bullet_count, evidence_sentences, extract_headings, has_table, numbered_count};
use crate::analysis::text::find_years;
use crate::model::{ArticleType, ContentDraft, IssueRule, ValidationIssue};

const MIN_STEPS: usize = 3;
const MIN_RANKED_ITEMS: usize = 3;
const MIN_CHECKLIST_ITEMS: usize = 3;

static STEP_HEADING_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMBERED_HEADING_REGEX: OnceLock<Regex> = OnceLock::new();

fn step_heading_regex() -> &'static Regex {
    STEP_HEADING_REGEX.get_or_init(|| Regex::new(r"(?i)(?:步驟|第[一二三四五六七八九十\d]+步|\bstep\s*\d*)").unwrap())
}

fn numbered_heading_regex() -> &'static Regex {
    NUMBERED_HEADING_REGEX
        .get_or_init(|| Regex::new(r"^(?:\d{1,2}[.)、]|第[一二三四五六七八九十\d]+名|No\.\s*\d)").unwrap())
}

fn heading_matches(body: &str, keywords: &[&str]) -> bool {
    extract_headings(body).iter().any(|h| {
        let lower = h.text.to_lowercase();
        keywords.iter().any(|k| lower.contains(k))
    })
}

fn count_headings(body: &str, regex: &Regex) -> usize {
    extract_headings(body).iter().filter(|h| regex.is_match(&h.text)).count()
}

/// 来源与年份同时出现
fn has_sourced_year(body: &str) -> bool {
    !evidence_sentences(body).is_empty()
        || body
            .lines()
            .any(|line| has_citation_keyword(line) && !find_years(line).is_empty())
}

/// 返回缺失的结构要求
pub fn missing_requirements(article_type: ArticleType, body: &str) -> Vec<String> {
    let mut missing = Vec::new();
    match article_type {
        ArticleType::HowTo => {
            let steps = numbered_count(body) + count_headings(body, step_heading_regex());
            if steps < MIN_STEPS {
                missing.push(format!("教学文至少需要 {} 个步骤，实际 {}", MIN_STEPS, steps));
            }
        }
        ArticleType::Ranking => {
            let items = numbered_count(body) + count_headings(body, numbered_heading_regex());
            if items < MIN_RANKED_ITEMS {
                missing.push(format!("排行文至少需要 {} 个编号项目，实际 {}", MIN_RANKED_ITEMS, items));
            }
        }
        ArticleType::TrendAnalysis => {
            if !has_sourced_year(body) {
                missing.push("趋势分析需要附带来源与年份的数据".to_string());
            }
            if !heading_matches(body, &["趨勢", "展望", "trend", "outlook"]) {
                missing.push("趋势分析需要「趨勢」或「展望」章节".to_string());
            }
        }
        ArticleType::CaseReview => {
            if !heading_matches(body, &["背景", "background"]) {
                missing.push("案例回顾需要「背景」章节".to_string());
            }
            if !heading_matches(body, &["結果", "成果", "成效", "result"]) {
                missing.push("案例回顾需要「結果」或「成果」章节".to_string());
            }
        }
        ArticleType::Comparison => {
            if !has_table(body) && !heading_matches(body, &["比較", "差異", "對比", "vs"]) {
                missing.push("比较文需要比较表格或比较章节".to_string());
            }
        }
        ArticleType::PracticalGuide => {
            let items = bullet_count(body);
            if items < MIN_CHECKLIST_ITEMS {
                missing.push(format!("实用指南至少需要 {} 个列表项，实际 {}", MIN_CHECKLIST_ITEMS, items));
            }
            if !heading_matches(body, &["注意事項", "重點", "清單", "檢查"]) {
                missing.push("实用指南需要「注意事項」「重點」或「清單」章节".to_string());
            }
        }
        ArticleType::General => {}
    }
    missing
}

/// 文章类型结构校验器
pub struct ArticleTypeStructure;

impl Validator for ArticleTypeStructure {
    fn name(&self) -> &'static str {
        "article_type_structure"
    }

    fn validate(&self, draft: &ContentDraft, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        missing_requirements(ctx.article_type, &draft.body)
            .into_iter()
            .map(|message| ValidationIssue::hard(IssueRule::ArticleTypeStructure, message))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_how_to_counts_steps_and_step_headings() {
        assert_eq!(missing_requirements(ArticleType::HowTo, "1. 註冊\n2. 設定\n3. 發布").len(), 0);
        assert_eq!(
            missing_requirements(ArticleType::HowTo, "## 步驟一\n內容\n## 步驟二\n內容\n## 步驟三\n內容").len(),
            0
        );
        assert_eq!(missing_requirements(ArticleType::HowTo, "只有說明").len(), 1);
    }

    #[test]
    fn test_trend_analysis_needs_source_and_outlook() {
        let body = "## 產業趨勢\n根據調查，2025年採用率成長。";
        assert!(missing_requirements(ArticleType::TrendAnalysis, body).is_empty());
        assert_eq!(missing_requirements(ArticleType::TrendAnalysis, "## 現況\n內容").len(), 2);
    }

    #[test]
    fn test_case_review_and_comparison() {
        assert!(missing_requirements(ArticleType::CaseReview, "## 背景\nA\n## 成果\nB").is_empty());
        assert!(missing_requirements(ArticleType::Comparison, "| A | B |\n| --- | --- |\n| 1 | 2 |").is_empty());
        assert!(missing_requirements(ArticleType::General, "").is_empty());
    }

    #[test]
    fn test_practical_guide() {
        let body = "## 注意事項\n- 一\n- 二\n- 三";
        assert!(missing_requirements(ArticleType::PracticalGuide, body).is_empty());
    }
}
