//! 过时年份改写

use crate::analysis::text::YearToken;
use crate::config::constants;
use crate::model::ContentDraft;
use crate::validators::freshness::{in_citation_window, stale_tokens_in_line};

/// 年份区间的连接符，例如 2023–2024、2023 至 2024
const RANGE_JOINERS: &[char] = &['-', '–', '—', '~', '～', '至', '到', ' '];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Primary,
    Secondary,
}

impl Language {
    fn placeholder(&self) -> &'static str {
        match self {
            Language::Primary => constants::NEUTRAL_YEAR_ZH,
            Language::Secondary => constants::NEUTRAL_YEAR_EN,
        }
    }
}

/// 把相邻的年份标记（区间）合并为一个替换范围
fn merge_ranges(line: &str, tokens: &[YearToken]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for token in tokens {
        if let Some(last) = ranges.last_mut() {
            let gap = &line[last.1..token.start];
            if !gap.is_empty() && gap.chars().all(|c| RANGE_JOINERS.contains(&c)) {
                last.1 = token.end;
                continue;
            }
        }
        ranges.push((token.start, token.end));
    }
    ranges
}

fn replace_tokens(line: &str, tokens: &[YearToken], language: Language) -> String {
    let mut result = line.to_string();
    for (start, end) in merge_ranges(line, tokens).into_iter().rev() {
        result.replace_range(start..end, language.placeholder());
    }
    result
}

/// 严格字段：所有过时年份都改写
pub fn rewrite_strict(text: &str, reference_year: i32, language: Language) -> String {
    text.lines()
        .map(|line| {
            let tokens = stale_tokens_in_line(line, reference_year);
            if tokens.is_empty() {
                line.to_string()
            } else {
                replace_tokens(line, &tokens, language)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 正文：只改写不在引用语境窗口内的过时年份
pub fn rewrite_body(text: &str, reference_year: i32, language: Language) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut changed = false;
    let rewritten: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let tokens = stale_tokens_in_line(line, reference_year);
            if tokens.is_empty() || in_citation_window(&lines, index) {
                line.to_string()
            } else {
                changed = true;
                replace_tokens(line, &tokens, language)
            }
        })
        .collect();

    if changed {
        rewritten.join("\n")
    } else {
        text.to_string()
    }
}

/// 改写草稿中所有字段的过时年份
pub fn rewrite_stale_years(draft: &mut ContentDraft, reference_year: i32) {
    draft.title = rewrite_strict(&draft.title, reference_year, Language::Primary);
    draft.seo_title = rewrite_strict(&draft.seo_title, reference_year, Language::Primary);
    draft.image_prompt = rewrite_strict(&draft.image_prompt, reference_year, Language::Secondary);
    draft.body = rewrite_body(&draft.body, reference_year, Language::Primary);
    draft.body_en = rewrite_body(&draft.body_en, reference_year, Language::Secondary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::freshness::stale_years_outside_citation;

    #[test]
    fn test_out_of_context_year_is_neutralised() {
        let body = "2024年是關鍵的一年。\n\n根據經濟部統計，2023年成長 5%。";
        let rewritten = rewrite_body(body, 2026, Language::Primary);
        assert!(rewritten.starts_with("近年是關鍵的一年。"));
        assert!(rewritten.contains("2023年成長"));
        assert!(stale_years_outside_citation(&rewritten, 2026).is_empty());
    }

    #[test]
    fn test_year_ranges_collapse_to_one_placeholder() {
        assert_eq!(
            rewrite_strict("2023-2024年趨勢", 2026, Language::Primary),
            "近年趨勢"
        );
        assert_eq!(
            rewrite_strict("Trends of 2024", 2026, Language::Secondary),
            "Trends of recent years"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let mut draft = ContentDraft {
            title: "2025年指南".to_string(),
            body: "回顧2022年的做法。".to_string(),
            ..Default::default()
        };
        rewrite_stale_years(&mut draft, 2026);
        let once = draft.clone();
        rewrite_stale_years(&mut draft, 2026);
        assert_eq!(draft, once);
        assert_eq!(draft.title, "近年指南");
    }
}
