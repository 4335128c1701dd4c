//! 双语一致性与修复阶梯集成测试

use std::sync::Arc;

use content_gate::bilingual::{
    check_consistency, patch_headings, BilingualLadder, LadderStep, SYNTHETIC_META_KEY,
};
use content_gate::{ContentDraft, ModelRouter, ProviderError};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::*;

const PRIMARY: &str = "## 背景\n公司過去三年的營收成長停滯，團隊開始思考新的經營方向。\n\n\
## 做法\n重新盤點產品線，把資源集中在最有競爭力的兩項服務。\n\n\
## 成果\n半年後詢問量明顯增加，老客戶的回購率也跟著提升。\n\n\
## 結論\n聚焦與持續調整，是小型企業轉型最務實的路線。";

const SECONDARY_TWO_HEADINGS: &str = "## Background\nRevenue had stalled for three years, so the team started looking for a new direction.\n\n\
The product line was reviewed and resources were focused on the two most competitive services.\n\n\
## Results\nSix months later inquiries rose noticeably and returning customers bought again more often.";

/// 标题缺两个时一致性失败，修补后恢复到 n-1 个标题并通过
#[test]
fn test_heading_patch_restores_structure() {
    let before = check_consistency(PRIMARY, SECONDARY_TWO_HEADINGS);
    assert_eq!(before.primary_headings, 4);
    assert_eq!(before.secondary_headings, 2);
    assert!(before.heading_mismatch());
    assert!(!before.passed());

    let patched = patch_headings(PRIMARY, SECONDARY_TWO_HEADINGS);
    let after = check_consistency(PRIMARY, &patched);
    assert_eq!(after.secondary_headings, 3);
    assert!(after.passed(), "{:?}", after.issues);
    assert!(patched.contains("## Background"));
}

fn bilingual_draft(body_en: &str) -> ContentDraft {
    let mut d = draft(GOOD_BODY);
    d.body_en = body_en.to_string();
    d
}

fn router(provider: Arc<ScriptedProvider>) -> ModelRouter {
    ModelRouter::from_config(provider, &test_config())
}

/// 结构化重译的结果一致时直接采用，并带回英文标题
#[tokio::test]
async fn test_ladder_accepts_structured_retranslation() {
    let reply = serde_json::json!({
        "title_en": "A Starter Guide to Content Marketing",
        "body_en": GOOD_BODY_EN,
    })
    .to_string();
    let provider = ScriptedProvider::always(Ok(reply));
    let router = router(provider.clone());
    let sizes = [900, 450];
    let mut d = bilingual_draft("Too short.");

    let step = BilingualLadder::new(&router, &sizes).synchronize(&mut d).await.unwrap();

    assert_eq!(step, LadderStep::Retranslation);
    assert_eq!(provider.call_count(), 1);
    assert_eq!(d.title_en, "A Starter Guide to Content Marketing");
    assert_eq!(d.body_en, GOOD_BODY_EN);
    assert_eq!(d.metadata[SYNTHETIC_META_KEY], serde_json::Value::Bool(false));
}

/// 已经一致的英文版本不调用补全服务
#[tokio::test]
async fn test_ladder_keeps_consistent_secondary() {
    let provider = ScriptedProvider::always(Ok("unused".to_string()));
    let router = router(provider.clone());
    let sizes = [900];
    let mut d = bilingual_draft(GOOD_BODY_EN);

    let step = BilingualLadder::new(&router, &sizes).synchronize(&mut d).await.unwrap();

    assert_eq!(step, LadderStep::Accepted);
    assert_eq!(provider.call_count(), 0);
}

/// 认证失败后不再调用服务，直接使用结构兜底并标记为合成内容
#[tokio::test]
async fn test_ladder_falls_back_after_fatal_rejection() {
    let provider = ScriptedProvider::always(Err(ProviderError::from_status(401, "invalid api key")));
    let router = router(provider.clone());
    let sizes = [900, 450];
    let mut d = bilingual_draft("");

    let step = BilingualLadder::new(&router, &sizes).synchronize(&mut d).await.unwrap();

    assert_eq!(step, LadderStep::StructuralFallback);
    assert_eq!(provider.call_count(), 1);
    assert_eq!(d.metadata[SYNTHETIC_META_KEY], serde_json::Value::Bool(true));
    assert_eq!(d.title_en, "Overview");
    assert!(check_consistency(&d.body, &d.body_en).passed());
    assert!(d.body_en.contains("## FAQ"));
}

/// 以介词结尾的完整英文句子不会被判定为截断，原译文保留
#[tokio::test]
async fn test_ladder_keeps_translation_ending_on_preposition() {
    let provider = ScriptedProvider::always(Err(ProviderError::from_status(401, "invalid api key")));
    let router = router(provider.clone());
    let sizes = [900];
    let body_en = GOOD_BODY_EN.replace(
        "early costs are mostly staff time.",
        "early costs are mostly staff time you can count on.",
    );
    assert!(body_en.ends_with("count on."));
    let mut d = bilingual_draft(&body_en);

    let step = BilingualLadder::new(&router, &sizes).synchronize(&mut d).await.unwrap();

    assert_eq!(step, LadderStep::Accepted);
    assert_eq!(provider.call_count(), 0);
    assert_eq!(d.body_en, body_en);
}
