//! 双语一致性校验
//!
//! 检查英文版本与中文主版本在结构上是否平行：
//! 长度比下限、标题数量（允许少一个）、链接数量、中文残留行、结尾完整性。

use crate::analysis::structure::extract_headings;
use crate::analysis::text::{find_urls, han_count, is_heading_line, visible_len};
use crate::model::{ContentDraft, IssueRule, ValidationIssue};
use crate::validators::{ValidationContext, Validator};

/// 中文残留行：至少 4 个汉字，或汉字占比超过 30%
const LEAKED_HAN_MIN: usize = 4;
const LEAKED_HAN_RATIO: f64 = 0.3;

/// 没有终止标点时表示句子被截断的连词；介词结尾（log in、rely on）是正常英文
pub(crate) const DANGLING_CONJUNCTIONS: &[&str] = &["and", "or", "but", "because", "which", "that"];

const TERMINAL_CHARS: &[char] = &['.', '!', '?', '。', '！', '？', ')', '）', '"', '\'', '”', '’', '|', '`', '*'];
const DANGLING_CHARS: &[char] = &[',', ':', ';', '-', '–', '—', '、', '，', '：', '；', '(', '['];

/// 长度比下限：主版本越长，要求越严格
pub fn min_length_ratio(primary_len: usize) -> f64 {
    if primary_len < 600 {
        0.6
    } else if primary_len < 1500 {
        0.8
    } else {
        0.9
    }
}

/// 一次一致性检查的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    pub primary_headings: usize,
    pub secondary_headings: usize,
    pub ratio: f64,
    pub min_ratio: f64,
    pub leaked_lines: usize,
    pub issues: Vec<String>,
}

impl ConsistencyReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    /// 仅有标题数量问题
    pub fn heading_mismatch(&self) -> bool {
        !heading_parity(self.primary_headings, self.secondary_headings)
    }
}

pub fn heading_parity(primary: usize, secondary: usize) -> bool {
    secondary == primary || secondary + 1 == primary
}

pub fn is_leaked_line(line: &str) -> bool {
    let han = han_count(line);
    if han == 0 {
        return false;
    }
    let total = visible_len(line).max(1);
    han >= LEAKED_HAN_MIN || han as f64 / total as f64 > LEAKED_HAN_RATIO
}

fn last_word(line: &str) -> String {
    line.trim_end_matches(|c: char| TERMINAL_CHARS.contains(&c) || c.is_whitespace())
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn ends_with_url(line: &str) -> bool {
    find_urls(line)
        .last()
        .map(|m| line[m.end..].trim().is_empty())
        .unwrap_or(false)
}

fn balanced(line: &str) -> bool {
    let count = |c: char| line.chars().filter(|x| *x == c).count();
    count('(') == count(')') && count('[') == count(']') && count('（') == count('）')
}

/// 结尾是否完整；返回问题描述
pub fn tail_problem(body: &str) -> Option<String> {
    let last = body.lines().rev().find(|l| !l.trim().is_empty())?.trim();

    if is_heading_line(last) {
        return Some(format!("结尾停在标题上: {}", last));
    }
    if ends_with_url(last) {
        return None;
    }
    if last.ends_with(DANGLING_CHARS) {
        return Some(format!("结尾以连接符号结束: {}", last));
    }
    if !balanced(last) {
        return Some(format!("结尾括号不成对: {}", last));
    }
    if last.ends_with(TERMINAL_CHARS) {
        return None;
    }
    if DANGLING_CONJUNCTIONS.contains(&last_word(last).as_str()) {
        return Some(format!("结尾以连接词结束: {}", last));
    }
    Some(format!("结尾缺少终止标点: {}", last))
}

/// 检查英文版本与主版本的一致性
pub fn check_consistency(primary: &str, secondary: &str) -> ConsistencyReport {
    let primary_headings = extract_headings(primary).len();
    let secondary_headings = extract_headings(secondary).len();
    let primary_len = visible_len(primary);
    let secondary_len = visible_len(secondary);
    let ratio = if primary_len == 0 {
        1.0
    } else {
        secondary_len as f64 / primary_len as f64
    };
    let min_ratio = min_length_ratio(primary_len);
    let leaked_lines = secondary.lines().filter(|l| is_leaked_line(l)).count();

    let mut issues = Vec::new();
    if secondary.trim().is_empty() && !primary.trim().is_empty() {
        issues.push("英文版本为空".to_string());
    }
    if ratio < min_ratio {
        issues.push(format!("英文长度比 {:.2} 低于下限 {:.2}", ratio, min_ratio));
    }
    if !heading_parity(primary_headings, secondary_headings) {
        issues.push(format!(
            "标题数量不一致: 中文 {}，英文 {}",
            primary_headings, secondary_headings
        ));
    }
    let primary_urls = find_urls(primary).len();
    let secondary_urls = find_urls(secondary).len();
    if primary_urls != secondary_urls {
        issues.push(format!("链接数量不一致: 中文 {}，英文 {}", primary_urls, secondary_urls));
    }
    if leaked_lines > 0 {
        issues.push(format!("英文版本中有 {} 行中文残留", leaked_lines));
    }
    if let Some(problem) = tail_problem(secondary) {
        issues.push(problem);
    }

    ConsistencyReport {
        primary_headings,
        secondary_headings,
        ratio,
        min_ratio,
        leaked_lines,
        issues,
    }
}

/// 定稿阶段使用的双语一致性校验器
pub struct BilingualConsistency;

impl Validator for BilingualConsistency {
    fn name(&self) -> &'static str {
        "bilingual_consistency"
    }

    fn validate(&self, draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<ValidationIssue> {
        if !draft.has_secondary() {
            return Vec::new();
        }
        check_consistency(&draft.body, &draft.body_en)
            .issues
            .into_iter()
            .map(|issue| ValidationIssue::hard(IssueRule::BilingualConsistency, issue))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY: &str = "## 一\n第一段內容。\n\n## 二\n第二段內容。";

    #[test]
    fn test_parallel_pair_passes() {
        let secondary = "## One\nThe first paragraph.\n\n## Two\nThe second paragraph.";
        let report = check_consistency(PRIMARY, secondary);
        assert!(report.passed(), "{:?}", report.issues);
    }

    #[test]
    fn test_one_fewer_heading_is_allowed() {
        assert!(heading_parity(4, 3));
        assert!(heading_parity(4, 4));
        assert!(!heading_parity(4, 2));
        assert!(!heading_parity(4, 5));
    }

    #[test]
    fn test_tail_problems() {
        assert!(tail_problem("A complete sentence.").is_none());
        assert!(tail_problem("Learn more: https://example.com/a").is_none());
        assert!(tail_problem("It was cut off and").is_some());
        assert!(tail_problem("Unclosed (bracket.").is_some());
        assert!(tail_problem("Trailing comma,").is_some());
        assert!(tail_problem("Text.\n\n## Heading").is_some());
    }

    #[test]
    fn test_terminated_preposition_endings_pass() {
        assert!(tail_problem("Create an account and log in.").is_none());
        assert!(tail_problem("Pick a partner you can rely on.").is_none());
        assert!(tail_problem("Early costs are mostly staff time you can count on.").is_none());
    }

    #[test]
    fn test_unterminated_conjunction_is_named() {
        let problem = tail_problem("Plan the topics and").unwrap();
        assert!(problem.contains("连接词"));
        let problem = tail_problem("Pick a partner you can rely on").unwrap();
        assert!(problem.contains("终止标点"));
    }

    #[test]
    fn test_leaked_lines_and_url_parity() {
        let primary = "內容 https://example.com/x 在這裡。";
        let secondary = "這是中文沒有翻譯的段落。";
        let report = check_consistency(primary, secondary);
        assert_eq!(report.leaked_lines, 1);
        assert!(report.issues.iter().any(|i| i.contains("链接数量")));
    }

    #[test]
    fn test_validator_ignores_single_language_drafts() {
        use crate::model::{ArticleType, ContentVariant, LinkPolicyContext, Platform};
        let ctx = ValidationContext::new(
            LinkPolicyContext::new(Platform::Blog, ContentVariant::Default),
            ArticleType::General,
            2026,
        );
        let draft = ContentDraft {
            body: PRIMARY.to_string(),
            ..Default::default()
        };
        assert!(BilingualConsistency.validate(&draft, &ctx).is_empty());
    }
}
