//! 链接策略校验
//!
//! URL 比较只看主机（去掉 `www.`）与路径（忽略末尾斜杠），查询串不参与比较。

use url::Url;

use super::{ValidationContext, Validator};
use crate::analysis::text::{contains_url, find_urls, is_han, strip_list_marker, strip_urls, UrlMatch};
use crate::config::constants;
use crate::model::{ContentDraft, IssueRule, LinkPolicyContext, ValidationIssue};

/// 规范化后的链接目标
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlTarget {
    pub host: String,
    pub path: String,
}

impl UrlTarget {
    pub fn parse(raw: &str) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;
        let host = url.host_str()?.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
        let path = url.path().trim_end_matches('/').to_string();
        Some(Self { host, path })
    }

    fn host_matches(&self, domain: &str) -> bool {
        let domain = domain.trim().trim_start_matches("www.").to_lowercase();
        !domain.is_empty() && (self.host == domain || self.host.ends_with(&format!(".{}", domain)))
    }
}

/// 正文中单个链接的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlClass {
    Primary,
    /// 与主链接同域但路径不同
    PrimaryPathMismatch,
    Shortener,
    AllowedSecondary,
    Disallowed,
}

pub fn is_shortener(target: &UrlTarget) -> bool {
    constants::SHORTENER_DOMAINS
        .iter()
        .any(|domain| target.host_matches(domain))
}

pub fn classify(url: &str, primary: Option<&UrlTarget>, policy: &LinkPolicyContext) -> UrlClass {
    let Some(target) = UrlTarget::parse(url) else {
        return UrlClass::Disallowed;
    };

    if primary == Some(&target) {
        return UrlClass::Primary;
    }
    if is_shortener(&target) {
        return UrlClass::Shortener;
    }
    if policy
        .secondary_allow_list
        .iter()
        .any(|domain| target.host_matches(domain))
    {
        return UrlClass::AllowedSecondary;
    }
    if primary.map(|p| p.host == target.host).unwrap_or(false) {
        return UrlClass::PrimaryPathMismatch;
    }
    UrlClass::Disallowed
}

/// 正文中的所有链接及其分类
pub fn inventory(body: &str, primary_url: &str, policy: &LinkPolicyContext) -> Vec<(UrlMatch, UrlClass)> {
    let primary = UrlTarget::parse(primary_url);
    find_urls(body)
        .into_iter()
        .map(|m| {
            let class = classify(&m.url, primary.as_ref(), policy);
            (m, class)
        })
        .collect()
}

/// 主链接在文本中的出现次数
pub fn primary_url_count(text: &str, primary_url: &str) -> usize {
    let Some(primary) = UrlTarget::parse(primary_url) else {
        return 0;
    };
    find_urls(text)
        .iter()
        .filter(|m| UrlTarget::parse(&m.url).as_ref() == Some(&primary))
        .count()
}

/// 只有链接、没有文字的行
pub fn is_isolated_url_line(line: &str) -> bool {
    if !contains_url(line) {
        return false;
    }
    let rest = strip_urls(strip_list_marker(line));
    !rest.chars().any(|c| c.is_alphanumeric() || is_han(c))
}

pub fn has_cta_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    constants::CTA_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// 行动呼吁行：含呼吁关键词，且本行或相邻行带有链接
pub fn cta_line_indices(body: &str) -> Vec<usize> {
    let lines: Vec<&str> = body.lines().collect();
    (0..lines.len())
        .filter(|&i| has_cta_keyword(lines[i]))
        .filter(|&i| {
            contains_url(lines[i])
                || (i > 0 && contains_url(lines[i - 1]))
                || lines.get(i + 1).map(|l| contains_url(l)).unwrap_or(false)
        })
        .collect()
}

/// 链接策略校验器
pub struct LinkPolicy;

impl Validator for LinkPolicy {
    fn name(&self) -> &'static str {
        "link_policy"
    }

    fn validate(&self, draft: &ContentDraft, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let policy = &ctx.link_policy;
        let links = inventory(&draft.body, &draft.cta_url, policy);

        if !draft.cta_url.trim().is_empty() {
            if UrlTarget::parse(&draft.cta_url).is_none() {
                issues.push(ValidationIssue::hard(
                    IssueRule::LinkPolicy,
                    format!("主链接无法解析: {}", draft.cta_url),
                ));
            } else {
                let count = links.iter().filter(|(_, c)| *c == UrlClass::Primary).count();
                if count != 1 {
                    issues.push(ValidationIssue::hard(
                        IssueRule::LinkPolicy,
                        format!("主链接出现 {} 次，应恰好 1 次", count),
                    ));
                }
            }
        }

        let mut secondary = 0;
        for (m, class) in &links {
            match class {
                UrlClass::Primary => {}
                UrlClass::AllowedSecondary => secondary += 1,
                UrlClass::PrimaryPathMismatch => issues.push(ValidationIssue::hard(
                    IssueRule::LinkPolicy,
                    format!("链接 {} 与主链接同域但路径不符", m.url),
                )),
                UrlClass::Shortener => issues.push(ValidationIssue::hard(
                    IssueRule::LinkPolicy,
                    format!("禁止使用短网址: {}", m.url),
                )),
                UrlClass::Disallowed => issues.push(ValidationIssue::hard(
                    IssueRule::LinkPolicy,
                    format!("链接 {} 不在允许名单中", m.url),
                )),
            }
        }

        let allowed = ctx.profile.secondary_links_allowed(policy.variant);
        if secondary > allowed {
            issues.push(ValidationIssue::hard(
                IssueRule::LinkPolicy,
                format!("次要链接 {} 个，超过上限 {}", secondary, allowed),
            ));
        }

        for (index, line) in draft.body.lines().enumerate() {
            if is_isolated_url_line(line) {
                issues.push(ValidationIssue::hard(
                    IssueRule::LinkPolicy,
                    format!("第 {} 行只有链接，没有说明文字", index + 1),
                ));
            }
        }

        let cta_lines = cta_line_indices(&draft.body).len();
        if cta_lines > ctx.profile.max_cta_lines {
            issues.push(ValidationIssue::hard(
                IssueRule::LinkPolicy,
                format!("行动呼吁 {} 行，超过平台上限 {}", cta_lines, ctx.profile.max_cta_lines),
            ));
        }

        issues
    }
}
