//! 时效性校验
//!
//! 严格字段（标题、搜索标题、配图提示）中出现早于参考年份的年份一律违规；
//! 正文中只有在前后各一行内都没有引用语境时才违规。链接内的数字不算年份。

use super::{ValidationContext, Validator};
use crate::analysis::text::{find_urls, find_years, YearToken};
use crate::config::constants;
use crate::model::{ContentDraft, IssueRule, ValidationIssue};

/// 一行中早于参考年份、且不在链接内的年份标记
pub fn stale_tokens_in_line(line: &str, reference_year: i32) -> Vec<YearToken> {
    let urls = find_urls(line);
    find_years(line)
        .into_iter()
        .filter(|token| token.year < reference_year)
        .filter(|token| !urls.iter().any(|u| token.start < u.end && u.start < token.end))
        .collect()
}

pub fn has_citation_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    constants::CITATION_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// 第 `index` 行是否处于引用语境窗口内
pub fn in_citation_window(lines: &[&str], index: usize) -> bool {
    let start = index.saturating_sub(constants::CITATION_WINDOW_LINES);
    let end = (index + constants::CITATION_WINDOW_LINES).min(lines.len().saturating_sub(1));
    (start..=end).any(|i| lines.get(i).map(|l| has_citation_keyword(l)).unwrap_or(false))
}

/// 正文中位于引用语境之外的过时年份：(行号, 年份标记)
pub fn stale_years_outside_citation(text: &str, reference_year: i32) -> Vec<(usize, YearToken)> {
    let lines: Vec<&str> = text.lines().collect();
    let mut found = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let tokens = stale_tokens_in_line(line, reference_year);
        if tokens.is_empty() || in_citation_window(&lines, index) {
            continue;
        }
        found.extend(tokens.into_iter().map(|t| (index, t)));
    }
    found
}

/// 时效性校验器
pub struct Freshness;

impl Validator for Freshness {
    fn name(&self) -> &'static str {
        "freshness"
    }

    fn validate(&self, draft: &ContentDraft, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let year = ctx.reference_year;

        let strict = [
            ("title", draft.title.as_str()),
            ("seo_title", draft.seo_title.as_str()),
            ("image_prompt", draft.image_prompt.as_str()),
        ];
        for (field, text) in strict {
            for token in stale_tokens_in_line(text, year) {
                issues.push(ValidationIssue::hard(
                    IssueRule::Freshness,
                    format!("{} 含有过时年份 {}（参考年份 {}）", field, token.year, year),
                ));
            }
        }

        for (field, text) in [("body", draft.body.as_str()), ("body_en", draft.body_en.as_str())] {
            for (line, token) in stale_years_outside_citation(text, year) {
                issues.push(ValidationIssue::hard(
                    IssueRule::Freshness,
                    format!(
                        "{} 第 {} 行的年份 {} 缺少引用语境",
                        field,
                        line + 1,
                        token.year
                    ),
                ));
            }
        }

        issues
    }
}
