//! 平台合规与安全用语校验

use super::links::{cta_line_indices, has_cta_keyword};
use super::{ValidationContext, Validator};
use crate::analysis::structure::faq_pair_count;
use crate::analysis::text::{contains_url, find_urls, lead_paragraph, visible_len};
use crate::config::constants;
use crate::model::{ContentDraft, IssueRule, ValidationIssue};

/// 营销词密度的分母下限（字），避免短文被过度放大
const MIN_DENSITY_CHARS: usize = 500;
const HARD_DENSITY_FACTOR: f64 = 1.5;

/// 每千字营销词命中次数
pub fn marketing_density(text: &str) -> f64 {
    let hits: usize = constants::MARKETING_KEYWORDS
        .iter()
        .map(|k| text.matches(k).count())
        .sum();
    let chars = visible_len(text).max(MIN_DENSITY_CHARS);
    hits as f64 * 1000.0 / chars as f64
}

fn searchable_text(draft: &ContentDraft) -> String {
    let mut text = String::new();
    for part in [&draft.title, &draft.seo_title, &draft.body] {
        text.push_str(part);
        text.push('\n');
    }
    text.push_str(&draft.hashtags.join(" "));
    text
}

/// 平台合规校验器
pub struct PlatformCompliance;

impl Validator for PlatformCompliance {
    fn name(&self) -> &'static str {
        "platform_compliance"
    }

    fn validate(&self, draft: &ContentDraft, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let profile = &ctx.profile;
        let mut issues = Vec::new();

        let links = find_urls(&draft.body).len();
        let max_links = profile.effective_max_links(ctx.link_policy.variant);
        if links > max_links {
            issues.push(ValidationIssue::hard(
                IssueRule::PlatformCompliance,
                format!("{} 平台最多 {} 个链接，实际 {} 个", profile.platform, max_links, links),
            ));
        }

        let text = searchable_text(draft);
        for phrase in profile.banned_phrases {
            if text.contains(phrase) {
                issues.push(ValidationIssue::hard(
                    IssueRule::PlatformCompliance,
                    format!("{} 平台禁用词: {}", profile.platform, phrase),
                ));
            }
        }

        let cta_lines = cta_line_indices(&draft.body).len();
        if cta_lines > profile.max_cta_lines {
            issues.push(ValidationIssue::hard(
                IssueRule::PlatformCompliance,
                format!("行动呼吁 {} 行，超过 {} 平台上限 {}", cta_lines, profile.platform, profile.max_cta_lines),
            ));
        }

        if !profile.cta_in_first_paragraph {
            if let Some(lead) = lead_paragraph(&draft.body) {
                if contains_url(&lead) && has_cta_keyword(&lead) {
                    issues.push(ValidationIssue::soft(
                        IssueRule::PlatformCompliance,
                        format!("{} 平台不建议在首段放置行动呼吁", profile.platform),
                    ));
                }
            }
        }

        let density = marketing_density(&draft.body);
        let ceiling = profile.max_marketing_per_kchar;
        if density > ceiling * HARD_DENSITY_FACTOR {
            issues.push(ValidationIssue::hard(
                IssueRule::PlatformCompliance,
                format!("营销词密度 {:.1}/千字，远超上限 {:.1}", density, ceiling),
            ));
        } else if density > ceiling {
            issues.push(ValidationIssue::soft(
                IssueRule::PlatformCompliance,
                format!("营销词密度 {:.1}/千字，超过上限 {:.1}", density, ceiling),
            ));
        }

        if profile.required_faq_pairs > 0 {
            let pairs = faq_pair_count(&draft.body);
            if pairs < profile.required_faq_pairs {
                issues.push(ValidationIssue::hard(
                    IssueRule::FaqSufficiency,
                    format!("FAQ 问答 {} 组，{} 平台需要 {} 组", pairs, profile.platform, profile.required_faq_pairs),
                ));
            }
        }

        issues
    }
}

/// 平台安全用语校验器（所有平台一律适用）
pub struct PlatformSafety;

impl Validator for PlatformSafety {
    fn name(&self) -> &'static str {
        "platform_safety"
    }

    fn validate(&self, draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let mut text = searchable_text(draft).to_lowercase();
        text.push('\n');
        text.push_str(&draft.title_en.to_lowercase());
        text.push('\n');
        text.push_str(&draft.body_en.to_lowercase());

        constants::SAFETY_PHRASES
            .iter()
            .filter(|phrase| text.contains(&phrase.to_lowercase()))
            .map(|phrase| {
                ValidationIssue::hard(IssueRule::PlatformSafety, format!("包含不安全用语: {}", phrase))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArticleType, ContentVariant, LinkPolicyContext, Platform};

    fn ctx(platform: Platform) -> ValidationContext {
        ValidationContext::new(
            LinkPolicyContext::new(platform, ContentVariant::Default),
            ArticleType::General,
            2026,
        )
    }

    fn draft(body: &str) -> ContentDraft {
        ContentDraft {
            title: "標題".to_string(),
            body: body.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_faq_sufficiency_without_faq_heading() {
        let issues = PlatformCompliance.validate(&draft("只有一段內容。"), &ctx(Platform::Medium));
        let faq: Vec<_> = issues.iter().filter(|i| i.rule == IssueRule::FaqSufficiency).collect();
        assert_eq!(faq.len(), 1);
        assert!(faq[0].is_hard());
    }

    #[test]
    fn test_facebook_requires_no_faq() {
        let issues = PlatformCompliance.validate(&draft("只有一段內容。"), &ctx(Platform::Facebook));
        assert!(issues.iter().all(|i| i.rule != IssueRule::FaqSufficiency));
    }

    #[test]
    fn test_banned_phrase_and_link_count() {
        let body = "私訊我 https://a.com/x https://b.com/y\n\nQ: 一？\nA: 是。\nQ: 二？\nA: 是。";
        let issues = PlatformCompliance.validate(&draft(body), &ctx(Platform::Linkedin));
        assert!(issues.iter().any(|i| i.message.contains("私訊我")));
        assert!(issues.iter().any(|i| i.message.contains("最多 1 个链接")));
    }

    #[test]
    fn test_marketing_density_tiers() {
        let heavy = "限時優惠，立即搶購！".repeat(20);
        let issues = PlatformCompliance.validate(&draft(&heavy), &ctx(Platform::Facebook));
        assert!(issues.iter().any(|i| i.is_hard() && i.message.contains("营销词密度")));
        assert!(marketing_density("平實的內容介紹。") < 1.0);
    }

    #[test]
    fn test_safety_phrases_apply_everywhere() {
        let mut d = draft("內容");
        d.body_en = "A risk-free plan.".to_string();
        let issues = PlatformSafety.validate(&d, &ctx(Platform::Blog));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, IssueRule::PlatformSafety);
    }
}
