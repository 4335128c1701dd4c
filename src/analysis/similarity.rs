//! 相似度与去重工具
//!
//! 基于字符二元组（bigram）的 Jaccard 相似度判断近似重复；长文本额外使用
//! 「包含 + 长度比」判定。去重同时作用于段落与行两个粒度，重复项中带 URL 的
//! 版本优先保留。

use std::collections::HashSet;

use crate::analysis::text::{contains_url, is_answer_line, is_heading_line, is_question_line, strip_urls};
use crate::config::constants;

/// 比较用的规范化：去 URL、转小写、去掉空白与标点
pub fn normalize_for_compare(text: &str) -> String {
    strip_urls(text)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn bigrams(normalized: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() == 1 {
        return HashSet::from([(chars[0], '\0')]);
    }
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// 字符二元组 Jaccard 相似度，范围 0.0..=1.0
pub fn bigram_jaccard(a: &str, b: &str) -> f64 {
    let left = bigrams(&normalize_for_compare(a));
    let right = bigrams(&normalize_for_compare(b));
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// 近似重复判定
pub fn is_near_duplicate(a: &str, b: &str) -> bool {
    let left = normalize_for_compare(a);
    let right = normalize_for_compare(b);
    if left.is_empty() || right.is_empty() {
        return false;
    }
    if left == right {
        return true;
    }

    let (short, long) = if left.chars().count() <= right.chars().count() {
        (&left, &right)
    } else {
        (&right, &left)
    };
    let short_len = short.chars().count();
    let long_len = long.chars().count();
    if short_len >= constants::CONTAINMENT_MIN_CHARS
        && long.contains(short.as_str())
        && short_len as f64 / long_len as f64 >= constants::CONTAINMENT_LENGTH_RATIO
    {
        return true;
    }

    bigram_jaccard(a, b) >= constants::NEAR_DUPLICATE_JACCARD
}

/// 在候选列表中去重；重复组中带 URL 的版本替换无 URL 的版本并占用较早的位置
fn dedup_units(units: Vec<String>, skip: impl Fn(&str) -> bool) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(units.len());

    for unit in units {
        if skip(&unit) || normalize_for_compare(&unit).chars().count() < constants::DEDUP_MIN_CHARS {
            kept.push(unit);
            continue;
        }

        let duplicate_of = kept
            .iter()
            .position(|existing| !skip(existing) && is_near_duplicate(existing, &unit));

        match duplicate_of {
            Some(index) => {
                if contains_url(&unit) && !contains_url(&kept[index]) {
                    tracing::debug!("去重：以带链接的版本替换重复内容");
                    kept[index] = unit;
                }
            }
            None => kept.push(unit),
        }
    }

    kept
}

fn is_structural_block(paragraph: &str) -> bool {
    let first = paragraph.lines().next().unwrap_or_default();
    is_heading_line(first)
        || is_question_line(first)
        || is_answer_line(first)
        || first.trim_start().starts_with('|')
}

/// 段落级去重（标题、FAQ 问答块与表格不参与）
pub fn dedup_paragraphs(body: &str) -> String {
    let paragraphs = crate::analysis::text::paragraphs(body);
    dedup_units(paragraphs, is_structural_block).join("\n\n")
}

/// 行级去重（仅在同一段落内部比较）
pub fn dedup_lines(body: &str) -> String {
    crate::analysis::text::paragraphs(body)
        .into_iter()
        .map(|paragraph| {
            let lines: Vec<String> = paragraph.lines().map(str::to_string).collect();
            dedup_units(lines, |line| {
                is_heading_line(line) || is_question_line(line) || is_answer_line(line)
            })
            .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 段落 + 行两级去重
pub fn dedup_body(body: &str) -> String {
    dedup_lines(&dedup_paragraphs(body))
}

/// 统计近似重复的段落对数量（评分与动作校验使用）
pub fn duplicate_paragraph_pairs(body: &str) -> usize {
    let paragraphs: Vec<String> = crate::analysis::text::paragraphs(body)
        .into_iter()
        .filter(|p| !is_structural_block(p))
        .filter(|p| normalize_for_compare(p).chars().count() >= constants::DEDUP_MIN_CHARS)
        .collect();

    let mut pairs = 0;
    for i in 0..paragraphs.len() {
        for j in (i + 1)..paragraphs.len() {
            if is_near_duplicate(&paragraphs[i], &paragraphs[j]) {
                pairs += 1;
            }
        }
    }
    pairs
}
