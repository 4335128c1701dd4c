//! 结构分析器
//!
//! 从类 Markdown 文本中提取结构信号：标题列表、FAQ 问答对数量、列表项数量、
//! 表格、证据句、导语「先给答案」钩子、定义句、可独立引用的短句。
//!
//! 所有函数都是纯函数，结果汇总为 [`StructureSignals`]，供校验器与评分引擎使用。

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::text::{
    contains_url, find_years, is_answer_line, is_faq_heading, is_heading_line, is_list_item,
    is_question_line, lead_paragraph, parse_heading, split_sentences, visible_len,
    Heading,
};

/// 权威来源关键词
const AUTHORITY_KEYWORDS: &[&str] = &[
    "根據", "政府", "主計總處", "經濟部", "衛福部", "國發會", "金管會", "內政部", "勞動部",
    "研究", "調查", "報告", "協會", "大學", "研究院", "統計", "資策會", "工研院", "公會",
    "gartner", "mckinsey", "deloitte", "pwc", "oecd", "who", "statista", "according to",
];

/// 导语中表示「先给答案」的关键词
const ANSWER_FIRST_KEYWORDS: &[&str] = &[
    "是指", "就是", "簡單來說", "答案是", "關鍵在於", "重點是", "總結來說", "一句話", "核心在於",
    "in short", "the answer is",
];

/// 以代词或连接词开头的句子不能脱离上下文被引用
const NON_QUOTABLE_OPENERS: &[&str] = &[
    "這", "此", "它", "他們", "其", "因此", "所以", "但是", "而且", "另外", "this", "it ", "they",
    "so ", "but ",
];

const QUOTABLE_MIN_CHARS: usize = 12;
const QUOTABLE_MAX_CHARS: usize = 80;

static NUMERIC_UNIT_REGEX: OnceLock<Regex> = OnceLock::new();
static PERIOD_REGEX: OnceLock<Regex> = OnceLock::new();
static DEFINITION_REGEX: OnceLock<Regex> = OnceLock::new();
static TABLE_ROW_REGEX: OnceLock<Regex> = OnceLock::new();
static TABLE_SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMBERED_REGEX: OnceLock<Regex> = OnceLock::new();
static OVERCLAIM_REGEX: OnceLock<Regex> = OnceLock::new();

fn numeric_unit_regex() -> &'static Regex {
    NUMERIC_UNIT_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\d+(?:[.,]\d+)?\s*(?:%|％|萬|億|倍|元|人|家|成|個百分點|percent|million|billion)")
            .unwrap()
    })
}

fn period_regex() -> &'static Regex {
    PERIOD_REGEX.get_or_init(|| Regex::new(r"(?i)(?:上半年|下半年|第[一二三四]季|\bQ[1-4]\b|去年|今年)").unwrap())
}

fn definition_regex() -> &'static Regex {
    DEFINITION_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:是指|指的是|是一種|定義為|泛指|意指|所謂|\bis a\b|\brefers to\b|\bis defined as\b)")
            .unwrap()
    })
}

fn table_row_regex() -> &'static Regex {
    TABLE_ROW_REGEX.get_or_init(|| Regex::new(r"^\s*\|.*\|\s*$").unwrap())
}

fn table_separator_regex() -> &'static Regex {
    TABLE_SEPARATOR_REGEX.get_or_init(|| Regex::new(r"^\s*\|?\s*:?-{3,}:?\s*(?:\|\s*:?-{3,}:?\s*)*\|?\s*$").unwrap())
}

fn numbered_regex() -> &'static Regex {
    NUMBERED_REGEX.get_or_init(|| Regex::new(r"^\s*(?:\d{1,2}[.)、]|[（(]\d{1,2}[)）])\s*\S").unwrap())
}

fn overclaim_regex() -> &'static Regex {
    OVERCLAIM_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:最好的|第一名|保證|100%|百分之百|絕對|唯一|史上最|guaranteed|best ever)").unwrap()
    })
}

/// 结构信号汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureSignals {
    pub heading_count: usize,
    pub faq_pairs: usize,
    pub bullet_count: usize,
    pub numbered_count: usize,
    pub has_table: bool,
    pub evidence_sentences: usize,
    pub answer_first: bool,
    pub has_definition: bool,
    pub quotable_sentences: usize,
    pub has_overclaim: bool,
}

impl StructureSignals {
    pub fn analyze(body: &str) -> Self {
        Self {
            heading_count: extract_headings(body).len(),
            faq_pairs: faq_pair_count(body),
            bullet_count: bullet_count(body),
            numbered_count: numbered_count(body),
            has_table: has_table(body),
            evidence_sentences: evidence_sentences(body).len(),
            answer_first: has_answer_first_hook(body),
            has_definition: has_definition(body),
            quotable_sentences: quotable_sentence_count(body),
            has_overclaim: has_overclaim(body),
        }
    }

    /// 是否存在列表或表格
    pub fn has_list_or_table(&self) -> bool {
        self.bullet_count > 0 || self.has_table
    }
}

/// 提取全部标题
pub fn extract_headings(body: &str) -> Vec<Heading> {
    body.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            parse_heading(line).map(|(level, text)| Heading {
                level,
                text,
                line_index: index,
            })
        })
        .collect()
}

fn ends_with_question(text: &str) -> bool {
    let trimmed = text.trim().trim_end_matches('*').trim_end();
    trimmed.ends_with('？') || trimmed.ends_with('?')
}

/// FAQ 问答对数量：取「标题式」与「行内 Q:/A: 式」两种检测结果的较大值
pub fn faq_pair_count(body: &str) -> usize {
    // 标题式：FAQ 标题之后、以问号结尾的子标题
    let mut heading_based = 0;
    let mut in_faq = false;
    let mut faq_level = 0;
    for heading in extract_headings(body) {
        if is_faq_heading(&heading.text) {
            in_faq = true;
            faq_level = heading.level;
            continue;
        }
        if in_faq && heading.level <= faq_level {
            in_faq = false;
        }
        if in_faq && ends_with_question(&heading.text) {
            heading_based += 1;
        }
    }

    // 行内式：Q 行与 A 行数量的较小值
    let questions = body.lines().filter(|l| is_question_line(l)).count();
    let answers = body.lines().filter(|l| is_answer_line(l)).count();
    let inline_based = questions.min(answers);

    heading_based.max(inline_based)
}

/// 列表项数量（含有序列表）
pub fn bullet_count(body: &str) -> usize {
    body.lines().filter(|l| is_list_item(l)).count()
}

/// 有序列表项数量
pub fn numbered_count(body: &str) -> usize {
    body.lines().filter(|l| numbered_regex().is_match(l)).count()
}

/// 表格检测：至少两行表格行，且存在分隔行
pub fn has_table(body: &str) -> bool {
    let rows = body.lines().filter(|l| table_row_regex().is_match(l)).count();
    let separator = body
        .lines()
        .any(|l| l.contains('-') && l.contains('|') && table_separator_regex().is_match(l));
    rows >= 2 && separator
}

fn has_authority(line: &str) -> bool {
    let lower = line.to_lowercase();
    AUTHORITY_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn has_period(line: &str) -> bool {
    !find_years(line).is_empty() || period_regex().is_match(line)
}

fn has_numeric_value(line: &str) -> bool {
    numeric_unit_regex().is_match(line)
}

/// 证据句：同一行内同时出现权威来源、年份/期间与带单位数值
pub fn evidence_sentences(body: &str) -> Vec<String> {
    body.lines()
        .filter(|line| !is_heading_line(line))
        .filter(|line| has_authority(line) && has_period(line) && has_numeric_value(line))
        .map(|line| line.trim().to_string())
        .collect()
}

/// 导语是否「先给答案」：包含答案关键词或问号
pub fn has_answer_first_hook(body: &str) -> bool {
    match lead_paragraph(body) {
        Some(lead) => {
            let lower = lead.to_lowercase();
            ANSWER_FIRST_KEYWORDS.iter().any(|k| lower.contains(k))
                || lead.contains('？')
                || lead.contains('?')
        }
        None => false,
    }
}

/// 是否有定义句
pub fn has_definition(body: &str) -> bool {
    body.lines()
        .filter(|line| !is_heading_line(line))
        .any(|line| definition_regex().is_match(line))
}

/// 可独立引用的短句数量
pub fn quotable_sentence_count(body: &str) -> usize {
    body.lines()
        .filter(|line| !is_heading_line(line) && !is_question_line(line))
        .flat_map(split_sentences)
        .filter(|sentence| is_quotable(sentence))
        .count()
}

fn is_quotable(sentence: &str) -> bool {
    let len = visible_len(sentence);
    if !(QUOTABLE_MIN_CHARS..=QUOTABLE_MAX_CHARS).contains(&len) || contains_url(sentence) {
        return false;
    }
    let stripped = crate::analysis::text::strip_list_marker(sentence);
    let stripped = stripped
        .trim_start_matches(|c: char| c == 'A' || c == '答' || c == ':' || c == '：')
        .trim_start();
    let lower = stripped.to_lowercase();
    !NON_QUOTABLE_OPENERS.iter().any(|opener| lower.starts_with(opener))
}

/// 是否包含夸大宣称
pub fn has_overclaim(body: &str) -> bool {
    overclaim_regex().is_match(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faq_pair_count_inline_and_heading() {
        let inline = "Q: 需要多久？\nA: 約兩週。\nQ: 費用？\nA: 依方案而定。";
        assert_eq!(faq_pair_count(inline), 2);

        let heading = "## 常見問題\n### 需要多久？\n約兩週。\n### 費用如何計算？\n依方案。\n## 結語\n### 還有問題？";
        assert_eq!(faq_pair_count(heading), 2);
    }

    #[test]
    fn test_table_detection() {
        assert!(has_table("| 方案 | 價格 |\n| --- | --- |\n| A | 100 |"));
        assert!(!has_table("| 只有一行 |"));
    }

    #[test]
    fn test_evidence_sentence_requires_all_three_signals() {
        let body = "根據經濟部2025年統計，中小企業數位化比例達 45%。\n根據經濟部的說法，數位化很重要。";
        assert_eq!(evidence_sentences(body).len(), 1);
    }

    #[test]
    fn test_answer_first_hook() {
        assert!(has_answer_first_hook("## 標題\n\n簡單來說，自動化就是讓流程自己跑。"));
        assert!(has_answer_first_hook("為什麼要做內容行銷？因為信任需要累積。"));
        assert!(!has_answer_first_hook("今天我們來聊聊內容行銷。"));
    }

    #[test]
    fn test_quotable_sentences_skip_pronoun_openers() {
        let body = "內容行銷的核心是持續提供有用資訊。這能帶來長期信任與穩定流量。品牌故事要與受眾需求連結。";
        assert_eq!(quotable_sentence_count(body), 2);
    }

    #[test]
    fn test_bullets_and_numbered() {
        let body = "- 第一點\n* 第二點\n1. 步驟一\n2) 步驟二\n---";
        assert_eq!(bullet_count(body), 4);
        assert_eq!(numbered_count(body), 2);
    }
}
