//! AI 改进动作完成度
//!
//! 自由文本的改进动作先按固定类别正则归类，再用该类别的检测器判断是否完成；
//! 无法归类的动作按关键词与正文的重合度判断。

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::analysis::similarity::duplicate_paragraph_pairs;
use crate::analysis::structure::evidence_sentences;
use crate::analysis::text::is_han;
use crate::model::AiActionReport;
use crate::validators::freshness::has_citation_keyword;

/// 同义异写的用词对：同时出现视为用词不一致
const TERM_VARIANTS: &[(&str, &str)] = &[
    ("台灣", "臺灣"),
    ("網路", "網絡"),
    ("資訊", "信息"),
    ("軟體", "軟件"),
    ("影片", "視頻"),
    ("行銷", "營銷"),
];

const KEYWORD_OVERLAP_THRESHOLD: f64 = 0.5;

/// 动作类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    CaseStudy,
    Evidence,
    TermConsistency,
    Dedup,
    Uncategorized,
}

static CASE_STUDY_REGEX: OnceLock<Regex> = OnceLock::new();
static EVIDENCE_REGEX: OnceLock<Regex> = OnceLock::new();
static TERM_REGEX: OnceLock<Regex> = OnceLock::new();
static DEDUP_REGEX: OnceLock<Regex> = OnceLock::new();
static CASE_PRESENCE_REGEX: OnceLock<Regex> = OnceLock::new();
static DIGIT_REGEX: OnceLock<Regex> = OnceLock::new();

fn case_study_regex() -> &'static Regex {
    CASE_STUDY_REGEX.get_or_init(|| Regex::new(r"(?i)(案例|實例|case study|example)").unwrap())
}

fn evidence_regex() -> &'static Regex {
    EVIDENCE_REGEX.get_or_init(|| Regex::new(r"(?i)(數據|證據|來源|引用|evidence|data|citation|source)").unwrap())
}

fn term_regex() -> &'static Regex {
    TERM_REGEX.get_or_init(|| Regex::new(r"(?i)(術語|一致|用詞|terminology|consistent)").unwrap())
}

fn dedup_regex() -> &'static Regex {
    DEDUP_REGEX.get_or_init(|| Regex::new(r"(?i)(重複|冗餘|duplicate|redundan)").unwrap())
}

fn case_presence_regex() -> &'static Regex {
    CASE_PRESENCE_REGEX
        .get_or_init(|| Regex::new(r"(?i)(案例|實例|例如|舉例|為例|case study|for example)").unwrap())
}

fn digit_regex() -> &'static Regex {
    DIGIT_REGEX.get_or_init(|| Regex::new(r"\d").unwrap())
}

pub fn categorize(action: &str) -> ActionCategory {
    if case_study_regex().is_match(action) {
        ActionCategory::CaseStudy
    } else if evidence_regex().is_match(action) {
        ActionCategory::Evidence
    } else if term_regex().is_match(action) {
        ActionCategory::TermConsistency
    } else if dedup_regex().is_match(action) {
        ActionCategory::Dedup
    } else {
        ActionCategory::Uncategorized
    }
}

/// 动作关键词：英文取长度 ≥3 的单词，中文取相邻二字组
fn action_keywords(action: &str) -> BTreeSet<String> {
    let mut keywords = BTreeSet::new();
    let mut han_run: Vec<char> = Vec::new();
    let mut word = String::new();

    let flush_han = |run: &mut Vec<char>, out: &mut BTreeSet<String>| {
        if run.len() == 1 {
            out.insert(run[0].to_string());
        }
        for pair in run.windows(2) {
            out.insert(pair.iter().collect());
        }
        run.clear();
    };
    let flush_word = |word: &mut String, out: &mut BTreeSet<String>| {
        if word.chars().count() >= 3 {
            out.insert(word.to_lowercase());
        }
        word.clear();
    };

    for c in action.chars() {
        if is_han(c) {
            flush_word(&mut word, &mut keywords);
            han_run.push(c);
        } else if c.is_alphanumeric() {
            flush_han(&mut han_run, &mut keywords);
            word.push(c);
        } else {
            flush_han(&mut han_run, &mut keywords);
            flush_word(&mut word, &mut keywords);
        }
    }
    flush_han(&mut han_run, &mut keywords);
    flush_word(&mut word, &mut keywords);
    keywords
}

/// 关键词重合度 0.0..=1.0
pub fn keyword_overlap(action: &str, body: &str) -> f64 {
    let keywords = action_keywords(action);
    if keywords.is_empty() {
        return 0.0;
    }
    let lower = body.to_lowercase();
    let hits = keywords.iter().filter(|k| lower.contains(k.as_str())).count();
    hits as f64 / keywords.len() as f64
}

pub fn has_case_study(body: &str) -> bool {
    case_presence_regex().is_match(body)
}

pub fn has_evidence(body: &str) -> bool {
    !evidence_sentences(body).is_empty()
        || body
            .lines()
            .any(|line| has_citation_keyword(line) && digit_regex().is_match(line))
}

/// 同时出现的同义异写用词对
pub fn inconsistent_terms(body: &str) -> Vec<(&'static str, &'static str)> {
    TERM_VARIANTS
        .iter()
        .filter(|(a, b)| body.contains(a) && body.contains(b))
        .copied()
        .collect()
}

pub fn is_completed(action: &str, body: &str) -> bool {
    match categorize(action) {
        ActionCategory::CaseStudy => has_case_study(body),
        ActionCategory::Evidence => has_evidence(body),
        ActionCategory::TermConsistency => inconsistent_terms(body).is_empty(),
        ActionCategory::Dedup => duplicate_paragraph_pairs(body) == 0,
        ActionCategory::Uncategorized => keyword_overlap(action, body) >= KEYWORD_OVERLAP_THRESHOLD,
    }
}

/// 计算动作完成度报告；没有动作时完成度为 100
pub fn score_actions(actions: &[String], body: &str) -> AiActionReport {
    let mut required = Vec::new();
    let mut seen = BTreeSet::new();
    for action in actions {
        let trimmed = action.trim();
        if !trimmed.is_empty() && seen.insert(trimmed.to_string()) {
            required.push(trimmed.to_string());
        }
    }

    let (completed, unresolved): (Vec<String>, Vec<String>) =
        required.iter().cloned().partition(|action| is_completed(action, body));

    let completion = if required.is_empty() {
        100
    } else {
        (completed.len() * 100 / required.len()) as u32
    };

    AiActionReport {
        required,
        completed,
        unresolved,
        completion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("補充一個實際案例"), ActionCategory::CaseStudy);
        assert_eq!(categorize("加入數據來源"), ActionCategory::Evidence);
        assert_eq!(categorize("統一術語"), ActionCategory::TermConsistency);
        assert_eq!(categorize("刪除重複段落"), ActionCategory::Dedup);
        assert_eq!(categorize("加強結語"), ActionCategory::Uncategorized);
    }

    #[test]
    fn test_term_consistency() {
        assert_eq!(inconsistent_terms("台灣與臺灣混用"), vec![("台灣", "臺灣")]);
        assert!(inconsistent_terms("台灣企業").is_empty());
    }

    #[test]
    fn test_score_actions_mixed() {
        let body = "例如某家餐廳導入線上訂位。\n\n## 常見問題\nQ: 多久？\nA: 兩週。";
        let actions = vec![
            "補充一個實際案例".to_string(),
            "加入數據來源".to_string(),
            "補充常見問題".to_string(),
        ];
        let report = score_actions(&actions, body);
        assert_eq!(report.completed.len(), 2);
        assert_eq!(report.unresolved, vec!["加入數據來源".to_string()]);
        assert_eq!(report.completion, 66);
    }

    #[test]
    fn test_no_actions_is_complete() {
        assert_eq!(score_actions(&[], "內容").completion, 100);
    }
}
