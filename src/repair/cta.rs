//! 行动呼吁注入
//!
//! 正文中缺少主链接时，挑选得分最高的段落，在段尾补上一行带主链接的呼吁句。
//! 得分 = 主题相关度 + 与全文中点的距离 - 首段惩罚（平台不允许首段放呼吁时）。
//! 标题、列表、表格、FAQ 区域不作为候选。

use std::collections::HashSet;

use super::faq::faq_line_range;
use super::{stable_index, RepairContext};
use crate::analysis::text::{is_answer_line, is_han, is_heading_line, is_list_item, is_question_line};
use crate::validators::links::{has_cta_keyword, primary_url_count, UrlTarget};

const CTA_TEMPLATES: &[&str] = &[
    "想了解更多，歡迎參考：{url}",
    "如需進一步資訊，可以前往：{url}",
    "完整說明與詳情請見：{url}",
    "延伸閱讀與服務說明請點此：{url}",
];

const MAX_RELEVANCE_HITS: usize = 3;
const DISTANCE_WEIGHT: f64 = 2.0;
const LEAD_PENALTY: f64 = 10.0;

/// 连续非空行组成的段落块，[start, end] 为闭区间行下标
#[derive(Debug, Clone, Copy)]
struct Block {
    start: usize,
    end: usize,
}

fn blocks(lines: &[&str]) -> Vec<Block> {
    let mut result = Vec::new();
    let mut start: Option<usize> = None;
    for (index, line) in lines.iter().enumerate() {
        match (line.trim().is_empty(), start) {
            (false, None) => start = Some(index),
            (true, Some(s)) => {
                result.push(Block { start: s, end: index - 1 });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        result.push(Block { start: s, end: lines.len() - 1 });
    }
    result
}

fn is_prose_line(line: &str) -> bool {
    !is_heading_line(line)
        && !is_list_item(line)
        && !is_question_line(line)
        && !is_answer_line(line)
        && !line.trim_start().starts_with('|')
}

fn han_bigrams(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text.chars().filter(|c| is_han(*c)).collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// 主题相关度：关键词出现次数与主题二元组命中数，各自封顶
fn relevance(text: &str, ctx: &RepairContext) -> f64 {
    let lower = text.to_lowercase();
    let keyword = ctx.keyword.trim().to_lowercase();
    let keyword_hits = if keyword.is_empty() {
        0
    } else {
        lower.matches(keyword.as_str()).count()
    };
    let topic = han_bigrams(&ctx.topic);
    let topic_hits = han_bigrams(text).intersection(&topic).count();
    (keyword_hits.min(MAX_RELEVANCE_HITS) + topic_hits.min(MAX_RELEVANCE_HITS)) as f64
}

fn cta_line(cta_url: &str, ctx: &RepairContext) -> String {
    let index = stable_index(
        &[ctx.topic.as_str(), ctx.link_policy.platform.as_str()],
        CTA_TEMPLATES.len(),
    );
    CTA_TEMPLATES[index].replace("{url}", cta_url.trim())
}

/// 在最合适的段落末尾注入一行行动呼吁
pub fn inject_cta(body: &str, cta_url: &str, ctx: &RepairContext) -> String {
    if UrlTarget::parse(cta_url).is_none() || primary_url_count(body, cta_url) != 0 {
        return body.to_string();
    }

    let lines: Vec<&str> = body.lines().collect();
    let faq = faq_line_range(&lines);
    let in_faq = |index: usize| faq.as_ref().map(|r| r.contains(&index)).unwrap_or(false);
    let all_blocks = blocks(&lines);
    let lead = all_blocks
        .iter()
        .position(|b| !is_heading_line(lines[b.start]));
    let middle = lines.len() as f64 / 2.0;

    let mut best: Option<(f64, Block)> = None;
    for (position, block) in all_blocks.iter().enumerate() {
        let last = lines[block.end];
        if !is_prose_line(last) || in_faq(block.end) || has_cta_keyword(last) {
            continue;
        }

        let text = lines[block.start..=block.end].join("\n");
        let center = (block.start + block.end) as f64 / 2.0;
        let distance = if middle > 0.0 {
            ((center - middle).abs() / middle).min(1.0)
        } else {
            0.0
        };
        let mut score = relevance(&text, ctx) + DISTANCE_WEIGHT * distance;
        if Some(position) == lead && !ctx.profile.cta_in_first_paragraph {
            score -= LEAD_PENALTY;
        }

        // 同分时取较后的段落
        if best.map(|(s, _)| score >= s).unwrap_or(true) {
            best = Some((score, *block));
        }
    }

    let line = cta_line(cta_url, ctx);
    let mut output: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    match best {
        Some((score, block)) => {
            tracing::debug!("在第 {} 行后注入行动呼吁（得分 {:.2}）", block.end + 1, score);
            output.insert(block.end + 1, line);
        }
        None => {
            // 没有合适段落：在 FAQ 之前或文末新起一段
            let at = faq.map(|r| r.start).unwrap_or(output.len());
            tracing::debug!("没有合适段落，在第 {} 行新增行动呼吁段落", at);
            output.insert(at, String::new());
            output.insert(at, line);
            if at > 0 && !output[at - 1].trim().is_empty() {
                output.insert(at, String::new());
            }
        }
    }

    output.join("\n").trim_end().to_string()
}
