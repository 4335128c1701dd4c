//! 确定性修复集成测试
//!
//! 校验器发现问题 → 修复变换 → 重新校验，以及修复的幂等性

use content_gate::analysis::similarity::dedup_body;
use content_gate::analysis::structure::faq_pair_count;
use content_gate::repair::{apply_all, normalize_faq, rewrite_stale_years, RepairContext};
use content_gate::scoring::score_seo_geo;
use content_gate::validators::{Freshness, PlatformCompliance, ValidationContext, Validator};
use content_gate::{ArticleType, ContentVariant, IssueRule, LinkPolicyContext, Platform};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::*;

fn contexts(platform: Platform) -> (ValidationContext, RepairContext) {
    let link_policy = LinkPolicyContext::new(platform, ContentVariant::Default);
    (
        ValidationContext::new(link_policy.clone(), ArticleType::General, 2026),
        RepairContext::new("內容行銷", KEYWORD, link_policy, 2026),
    )
}

/// 没有 FAQ 的草稿被标记，规范化后问答数量达标
#[test]
fn test_missing_faq_is_flagged_then_normalized() {
    let (validation, repair) = contexts(Platform::Medium);
    let body = "簡單來說，內容行銷是用有價值的資訊吸引顧客。\n\n## 執行方式\n規劃每月固定的主題與發布節奏，並定期檢視成效。";
    let before = draft(body);

    let issues = PlatformCompliance.validate(&before, &validation);
    assert!(issues.iter().any(|i| i.rule == IssueRule::FaqSufficiency));

    let normalized = normalize_faq(body, &repair);
    let questions = normalized.lines().filter(|l| l.trim_start().starts_with("Q:")).count();
    let answers = normalized.lines().filter(|l| l.trim_start().starts_with("A:")).count();
    assert!(questions >= 2, "{}", normalized);
    assert!(answers >= 2, "{}", normalized);
    assert!(faq_pair_count(&normalized) >= 2);

    let after = draft(&normalized);
    let issues = PlatformCompliance.validate(&after, &validation);
    assert!(issues.iter().all(|i| i.rule != IssueRule::FaqSufficiency));
}

/// 没有引用来源的过时年份被改写为中性说法
#[test]
fn test_stale_year_is_neutralized() {
    let (validation, _) = contexts(Platform::Blog);
    let mut d = draft("2024年是品牌轉型的關鍵時期，很多團隊開始重新規劃內容。");

    assert!(!Freshness.validate(&d, &validation).is_empty());

    rewrite_stale_years(&mut d, 2026);
    assert!(!d.body.contains("2024"));
    assert!(Freshness.validate(&d, &validation).is_empty());
}

/// 相邻的重复句子只保留带链接的一句
#[test]
fn test_duplicate_sentence_keeps_url_variant() {
    let sentence = "這是一段三十個字左右的重複句子用來測試去重功能是否正確";
    let body = format!("{}\n{} https://example.com/offer", sentence, sentence);

    let deduped = dedup_body(&body);

    assert_eq!(deduped.matches(sentence).count(), 1);
    assert!(deduped.contains("https://example.com/offer"));
}

/// SEO 扣分逐项累计
#[test]
fn test_seo_penalties_accumulate() {
    let mut d = draft("這篇文章談談品牌經營的幾個方向。\n\n## 品牌故事\n從創辦人的經驗出發，說明品牌如何建立信任。");
    d.title = "品牌經營筆記".to_string();

    let score = score_seo_geo(&d, KEYWORD, 3, 85, 85);

    assert_eq!(score.seo, 100 - 25 - 15 - 15 - 15);
}

/// 对已经干净的草稿，修复不再产生变化
#[test]
fn test_apply_all_is_idempotent() {
    let (_, repair) = contexts(Platform::Blog);
    let once = apply_all(&draft(GOOD_BODY), &repair);
    let twice = apply_all(&once, &repair);
    assert_eq!(once, twice);
}

/// 有问题的草稿修复一次之后同样稳定
#[test]
fn test_apply_all_is_idempotent_on_flawed_draft() {
    let (_, repair) = contexts(Platform::Medium);
    let mut d = draft("2023年很多品牌開始重視內容經營。\n\n## 執行方式\n規劃主題。\n\n更多資訊 https://bit.ly/abc");
    d.body_en = "In 2023 many brands focused on content.".to_string();

    let once = apply_all(&d, &repair);
    let twice = apply_all(&once, &repair);

    assert_eq!(once, twice);
    assert!(!once.body.contains("bit.ly"));
    assert!(once.body.contains(CTA_URL));
}
