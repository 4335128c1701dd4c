//! FAQ 规范化
//!
//! 把零散的 FAQ 写法（问题子标题、`問:` 行、问句式段落）统一改写为
//! `Q:` / `A:` 成对的规范格式，缺少答案的问题用剩余叙述或导语补齐，
//! 数量不足时按平台要求补足。

use std::sync::OnceLock;

use regex::Regex;

use super::RepairContext;
use crate::analysis::similarity::normalize_for_compare;
use crate::analysis::text::{
    find_years, is_answer_line, is_faq_heading, is_question_line, lead_paragraph, parse_heading,
    split_sections, split_sentences, strip_list_marker, strip_urls, visible_len,
};
use crate::validators::depth::checked_sections;

static QA_PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();

fn qa_prefix_regex() -> &'static Regex {
    QA_PREFIX_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?:\*\*)?\s*(?:Q\d*|A\d*|問|答)\s*[:：.]\s*(?:\*\*)?\s*").unwrap()
    })
}

const FAQ_HEADING: &str = "常見問題";

/// 一组问答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqPair {
    pub question: String,
    pub answer: Option<String>,
}

/// FAQ 区域：[start, end) 行下标，start 为 FAQ 标题行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FaqRegion {
    start: usize,
    end: usize,
    level: usize,
}

fn locate_region(lines: &[&str]) -> Option<FaqRegion> {
    let (start, level) = lines.iter().enumerate().find_map(|(index, line)| {
        parse_heading(line)
            .filter(|(_, text)| is_faq_heading(text))
            .map(|(level, _)| (index, level))
    })?;
    let end = lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| parse_heading(line).map(|(l, _)| l <= level).unwrap_or(false))
        .map(|(index, _)| index)
        .unwrap_or(lines.len());
    Some(FaqRegion { start, end, level })
}

/// FAQ 区域覆盖的行范围（含标题行）
pub(super) fn faq_line_range(lines: &[&str]) -> Option<std::ops::Range<usize>> {
    locate_region(lines).map(|region| region.start..region.end)
}

fn strip_qa_prefix(line: &str) -> String {
    qa_prefix_regex()
        .replace(line, "")
        .trim()
        .trim_end_matches("**")
        .trim()
        .to_string()
}

fn ends_with_question(text: &str) -> bool {
    text.trim_end().ends_with('?') || text.trim_end().ends_with('？')
}

/// 解析 FAQ 区域内的问答，返回（问答列表，未归属的叙述行）
pub fn parse_pairs(region_lines: &[&str]) -> (Vec<FaqPair>, Vec<String>) {
    let mut pairs: Vec<FaqPair> = Vec::new();
    let mut leftover: Vec<String> = Vec::new();

    for line in region_lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some((_, text)) = parse_heading(line) {
            let text = strip_qa_prefix(&text);
            if ends_with_question(&text) {
                pairs.push(FaqPair { question: text, answer: None });
            } else {
                leftover.push(text);
            }
            continue;
        }

        if is_question_line(line) {
            pairs.push(FaqPair { question: strip_qa_prefix(line), answer: None });
            continue;
        }

        if is_answer_line(line) {
            let answer = strip_qa_prefix(line);
            match pairs.last_mut() {
                Some(pair) if pair.answer.is_none() => pair.answer = Some(answer),
                Some(pair) => append_answer(pair, &answer),
                None => leftover.push(answer),
            }
            continue;
        }

        let prose = strip_list_marker(trimmed).trim();
        let awaiting_answer = pairs.last().map(|p| p.answer.is_none()).unwrap_or(false);
        if ends_with_question(prose) && !awaiting_answer {
            pairs.push(FaqPair { question: prose.to_string(), answer: None });
            continue;
        }

        match pairs.last_mut() {
            Some(pair) => append_answer(pair, prose),
            None => leftover.push(prose.to_string()),
        }
    }

    (pairs, leftover)
}

fn append_answer(pair: &mut FaqPair, text: &str) {
    if text.is_empty() {
        return;
    }
    pair.answer = Some(match pair.answer.take() {
        Some(existing) => format!("{}{}", existing, text),
        None => text.to_string(),
    });
}

/// 可作为答案的句子：去掉链接，不含年份，足够长
fn usable_sentence(text: &str) -> Option<String> {
    split_sentences(&strip_urls(text))
        .into_iter()
        .map(|s| strip_list_marker(&s).trim().to_string())
        .find(|s| visible_len(s) >= 6 && find_years(s).is_empty() && !ends_with_question(s))
}

fn subject(ctx: &RepairContext) -> String {
    [ctx.topic.trim(), ctx.keyword.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("這個主題")
        .to_string()
}

fn default_answer(ctx: &RepairContext) -> String {
    format!(
        "{}的做法會依實際情況而不同，建議先釐清目標，再依照本文的重點逐步調整。",
        subject(ctx)
    )
}

fn template_pairs(ctx: &RepairContext) -> Vec<FaqPair> {
    let subject = subject(ctx);
    let templates: [(&str, &str); 5] = [
        (
            "什麼是{s}？",
            "{s}是指圍繞核心需求整理出的一套做法與觀念，重點在於理解目標並逐步落實。",
        ),
        (
            "{s}適合哪些人？",
            "想要系統性認識{s}、並希望在工作中實際應用的讀者，都可以從本文的步驟開始。",
        ),
        (
            "開始{s}需要準備什麼？",
            "建議先盤點現有資源與限制，設定可衡量的目標，再安排執行的優先順序。",
        ),
        (
            "執行{s}最常見的錯誤是什麼？",
            "最常見的錯誤是缺乏明確目標與追蹤方式，建議先定義衡量指標再開始執行。",
        ),
        (
            "如何評估{s}的成效？",
            "可以依照事先設定的指標定期檢視，並把結果記錄下來作為下一步調整的依據。",
        ),
    ];
    templates
        .iter()
        .map(|(q, a)| FaqPair {
            question: q.replace("{s}", &subject),
            answer: Some(a.replace("{s}", &subject)),
        })
        .collect()
}

/// 由正文的非 FAQ 章节生成候选问答
fn heading_pairs(body_outside_faq: &str) -> Vec<FaqPair> {
    let sections = split_sections(body_outside_faq);
    checked_sections(&sections)
        .into_iter()
        .filter_map(|(_, section)| {
            let heading = section.heading_text()?;
            let answer = usable_sentence(&section.content())?;
            let heading = heading.trim_end_matches(['?', '？', '：', ':']);
            Some(FaqPair {
                question: format!("{}的重點是什麼？", heading),
                answer: Some(answer),
            })
        })
        .collect()
}

fn render(pairs: &[FaqPair], level: usize) -> String {
    let mut out = format!("{} {}", "#".repeat(level), FAQ_HEADING);
    for (index, pair) in pairs.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let question = if ends_with_question(&pair.question) {
            pair.question.clone()
        } else {
            format!("{}？", pair.question)
        };
        out.push_str(&format!("\nQ: {}\nA: {}", question, pair.answer.as_deref().unwrap_or_default()));
    }
    out
}

/// 规范化正文中的 FAQ
pub fn normalize_faq(body: &str, ctx: &RepairContext) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let required = ctx.profile.required_faq_pairs;
    let region = locate_region(&lines);

    if region.is_none() && required == 0 {
        return body.to_string();
    }

    let (mut pairs, leftover, level, prefix, suffix) = match region {
        Some(region) => {
            let (pairs, leftover) = parse_pairs(&lines[region.start + 1..region.end]);
            (
                pairs,
                leftover,
                region.level,
                lines[..region.start].join("\n"),
                lines[region.end..].join("\n"),
            )
        }
        None => (Vec::new(), Vec::new(), 2, body.to_string(), String::new()),
    };

    // 去重
    let mut seen: Vec<String> = Vec::new();
    pairs.retain(|pair| {
        let key = normalize_for_compare(&pair.question);
        if key.is_empty() || seen.contains(&key) {
            return false;
        }
        seen.push(key);
        true
    });

    // 补答案
    let fallback = usable_sentence(&leftover.join("\n"))
        .or_else(|| lead_paragraph(&prefix).and_then(|p| usable_sentence(&p)))
        .unwrap_or_else(|| default_answer(ctx));
    for pair in pairs.iter_mut() {
        let missing = pair.answer.as_deref().map(|a| a.trim().is_empty()).unwrap_or(true);
        if missing {
            pair.answer = Some(fallback.clone());
        }
    }

    // 补数量
    if pairs.len() < required {
        let outside = format!("{}\n{}", prefix, suffix);
        let candidates = heading_pairs(&outside).into_iter().chain(template_pairs(ctx));
        for candidate in candidates {
            if pairs.len() >= required {
                break;
            }
            let key = normalize_for_compare(&candidate.question);
            if !seen.contains(&key) {
                seen.push(key);
                pairs.push(candidate);
            }
        }
        tracing::debug!("FAQ 已补足至 {} 组", pairs.len());
    }

    let rendered = render(&pairs, level);
    let prefix = prefix.trim_end();
    let suffix = suffix.trim_start_matches(['\n', ' ', '\t']);

    let mut result = String::new();
    if !prefix.is_empty() {
        result.push_str(prefix);
        result.push_str("\n\n");
    }
    result.push_str(&rendered);
    if !suffix.trim().is_empty() {
        result.push_str("\n\n");
        result.push_str(suffix);
    }
    result
}
