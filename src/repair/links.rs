//! 链接清理
//!
//! 保留第一个不在孤立行上的主链接，以及平台允许数量内的次要链接；
//! 其余链接全部移除。Markdown 链接移除后保留链接文字，移除后变空的行直接删除。

use std::sync::OnceLock;

use regex::Regex;

use super::RepairContext;
use crate::analysis::text::{contains_url, find_urls, is_han};
use crate::validators::links::{classify, cta_line_indices, is_isolated_url_line, UrlClass, UrlTarget};

static MARKDOWN_LINK_REGEX: OnceLock<Regex> = OnceLock::new();

fn markdown_link_regex() -> &'static Regex {
    MARKDOWN_LINK_REGEX.get_or_init(|| Regex::new(r"\[([^\]]*)\]\(\s*(https?://[^)\s]+)\s*\)").unwrap())
}

/// 链接移除后残留在行尾的引导符号
const DANGLING_TAIL: &[char] = &[':', '：', '-', '–', '(', '（', '<', '[', '→', '👉'];

fn remove_url(line: &str, url: &str) -> String {
    // Markdown 链接：保留文字
    let mut replaced = None;
    for caps in markdown_link_regex().captures_iter(line) {
        if caps.get(2).map(|m| m.as_str()) == Some(url) {
            if let (Some(whole), Some(text)) = (caps.get(0), caps.get(1)) {
                let mut result = line.to_string();
                result.replace_range(whole.range(), text.as_str());
                replaced = Some(result);
                break;
            }
        }
    }
    let result = match replaced {
        Some(result) => result,
        None => cut_url(line, url),
    };

    result
        .trim_end()
        .trim_end_matches(|c: char| DANGLING_TAIL.contains(&c) || c.is_whitespace())
        .to_string()
}

/// 只删去链接本身；两侧都是空白时合并成一个空格，行内其他空白不动
fn cut_url(line: &str, url: &str) -> String {
    let bracketed = format!("<{}>", url);
    let target = if line.contains(&bracketed) { bracketed.as_str() } else { url };
    let Some(start) = line.find(target) else {
        return line.to_string();
    };
    let before = &line[..start];
    let after = &line[start + target.len()..];
    if before.ends_with(char::is_whitespace) && after.starts_with(char::is_whitespace) {
        format!("{} {}", before.trim_end(), after.trim_start())
    } else {
        format!("{}{}", before, after)
    }
}

fn has_text(line: &str) -> bool {
    line.chars().any(|c| c.is_alphanumeric() || is_han(c))
}

/// 清理正文中的违规与多余链接
pub fn strip_links(body: &str, primary_url: &str, ctx: &RepairContext) -> String {
    let primary = UrlTarget::parse(primary_url);
    let secondary_allowed = ctx.profile.secondary_links_allowed(ctx.link_policy.variant);

    let mut primary_kept = false;
    let mut secondary_kept = 0;
    let mut removed = 0;
    let mut lines: Vec<String> = Vec::new();

    for line in body.lines() {
        if !contains_url(line) {
            lines.push(line.to_string());
            continue;
        }

        let isolated = is_isolated_url_line(line);
        let mut current = line.to_string();
        for m in find_urls(line) {
            let keep = match classify(&m.url, primary.as_ref(), &ctx.link_policy) {
                UrlClass::Primary if !primary_kept && !isolated => {
                    primary_kept = true;
                    true
                }
                UrlClass::AllowedSecondary if secondary_kept < secondary_allowed && !isolated => {
                    secondary_kept += 1;
                    true
                }
                _ => false,
            };
            if !keep {
                current = remove_url(&current, &m.url);
                removed += 1;
            }
        }

        if has_text(&current) {
            lines.push(current);
        }
    }

    let mut result = lines.join("\n");
    if removed > 0 {
        tracing::debug!("移除了 {} 个不合规链接", removed);
    }

    // 仍超出行动呼吁上限时，删除不带链接、只因相邻而计入的呼吁行
    let max_cta = ctx.profile.max_cta_lines;
    loop {
        let cta_lines = cta_line_indices(&result);
        if cta_lines.len() <= max_cta {
            break;
        }
        let all: Vec<&str> = result.lines().collect();
        let Some(&drop_index) = cta_lines.iter().rev().find(|&&i| !contains_url(all[i])) else {
            break;
        };
        result = all
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != drop_index)
            .map(|(_, l)| *l)
            .collect::<Vec<_>>()
            .join("\n");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentVariant, LinkPolicyContext, Platform};

    const PRIMARY: &str = "https://example.com/services/seo";

    fn ctx(platform: Platform) -> RepairContext {
        RepairContext::new(
            "SEO 服務",
            "SEO",
            LinkPolicyContext::new(platform, ContentVariant::Default).with_allow_list(["partner.org"]),
            2026,
        )
    }

    #[test]
    fn test_keeps_one_primary_and_drops_the_rest() {
        let body = "服務介紹 https://example.com/services/seo\n\n再一次 https://example.com/services/seo/\n\n短網址 https://bit.ly/x\n\n外部 https://spam.io/a";
        let stripped = strip_links(body, PRIMARY, &ctx(Platform::Blog));
        let urls = find_urls(&stripped);
        assert_eq!(urls.len(), 1);
        assert!(stripped.contains("再一次"));
        assert!(stripped.contains("短網址"));
    }

    #[test]
    fn test_markdown_link_text_survives() {
        let body = "參考[合作夥伴](https://spam.io/a)的資料。\n主連結 https://example.com/services/seo";
        let stripped = strip_links(body, PRIMARY, &ctx(Platform::Blog));
        assert!(stripped.starts_with("參考合作夥伴的資料。"));
    }

    #[test]
    fn test_removed_url_leaves_other_spacing_alone() {
        assert_eq!(remove_url("A  B https://spam.io/x C", "https://spam.io/x"), "A  B C");
        assert_eq!(remove_url("見 <https://spam.io/x> 說明", "https://spam.io/x"), "見 說明");
        assert_eq!(remove_url("程式碼    縮排 https://spam.io/x", "https://spam.io/x"), "程式碼    縮排");
    }

    #[test]
    fn test_isolated_lines_are_removed() {
        let body = "導語。\nhttps://example.com/services/seo\n結尾。";
        let stripped = strip_links(body, PRIMARY, &ctx(Platform::Blog));
        assert_eq!(stripped, "導語。\n結尾。");
    }

    #[test]
    fn test_secondary_limit_per_platform() {
        let body = "主 https://example.com/services/seo\n延伸 https://partner.org/report";
        let blog = strip_links(body, PRIMARY, &ctx(Platform::Blog));
        assert_eq!(find_urls(&blog).len(), 2);
        let linkedin = strip_links(body, PRIMARY, &ctx(Platform::Linkedin));
        assert_eq!(find_urls(&linkedin).len(), 1);
    }

    #[test]
    fn test_strip_links_is_idempotent() {
        let body = "主 https://example.com/services/seo 與 https://example.com/about\n立即預約\n點此了解";
        let c = ctx(Platform::Linkedin);
        let once = strip_links(body, PRIMARY, &c);
        assert_eq!(strip_links(&once, PRIMARY, &c), once);
    }
}
