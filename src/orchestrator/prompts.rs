//! 生成、修订与可提取性强化的提示词

use std::collections::BTreeSet;

use crate::config::PlatformProfile;
use crate::model::{ContentDraft, GenerationRequest, IssueRule, Platform, ValidationIssue};

const DRAFT_SYSTEM_PROMPT: &str = "你是一位熟悉台灣讀者的資深內容編輯，使用繁體中文（台灣用語）寫作，並同時提供對應的英文版本。\
只回傳一個 JSON 物件，鍵為 title、body、title_en、body_en、hashtags、image_prompt、seo_title，不要加任何說明。\
body 使用 Markdown 小標題（##），段落之間空一行；body_en 必須與 body 的段落與小標題一一對應。";

fn platform_style(platform: Platform) -> &'static str {
    match platform {
        Platform::Blog => "部落格長文：小標題清楚、段落完整，適合搜尋引擎收錄。",
        Platform::Medium => "Medium 專欄：敘事流暢，觀點明確，避免條列過多。",
        Platform::Linkedin => "LinkedIn 貼文：專業語氣，開頭直接點出觀點，第一段不放連結。",
        Platform::Facebook => "Facebook 貼文：口語親切、段落短，不需要常見問題段落。",
        Platform::Vocus => "方格子文章：深度分享，結構完整，語氣真誠。",
    }
}

/// 草稿生成的提示词 (system, user)
pub fn draft_prompts(request: &GenerationRequest, profile: &PlatformProfile, reference_year: i32) -> (String, String) {
    let mut user = format!(
        "主題：{}\n關鍵字：{}\n平台：{}\n風格：{}\n文章類型：{}\n指定連結：{}\n年份基準：{}\n",
        request.topic,
        request.keyword,
        request.platform,
        platform_style(request.platform),
        request.article_type,
        request.cta_url,
        reference_year,
    );
    user.push_str(&format!(
        "規範：全文最多 {} 個連結，指定連結只出現一次且不可單獨成行；行動呼籲句最多 {} 句。\n",
        profile.max_links, profile.max_cta_lines
    ));
    if profile.required_faq_pairs > 0 {
        user.push_str(&format!(
            "文末加入「## 常見問題」段落，至少 {} 組問答，格式為「Q: 問題」「A: 回答」。\n",
            profile.required_faq_pairs
        ));
    }
    if !request.improvement_actions.is_empty() {
        user.push_str("本次需要落實的改進：\n");
        for action in &request.improvement_actions {
            user.push_str(&format!("- {}\n", action));
        }
    }
    (DRAFT_SYSTEM_PROMPT.to_string(), user)
}

/// 单条问题对应的修正指示
fn instruction_for(issue: &ValidationIssue, request: &GenerationRequest, profile: &PlatformProfile) -> String {
    match issue.rule {
        IssueRule::LanguagePurity => {
            "中文欄位全部使用繁體中文（台灣用語），英文欄位不可夾帶中文字元，並移除 JSON 鍵名與跳脫字元。".to_string()
        }
        IssueRule::LinkPolicy => format!(
            "全文只保留一次指定連結 {}，刪除其他網址與短網址，連結要放在句子裡而不是單獨一行。",
            request.cta_url
        ),
        IssueRule::Freshness => "刪除沒有資料來源的舊年份，改用「近年」等中性說法。".to_string(),
        IssueRule::StructuralDepth => "每個小標題下至少寫兩到三句具體內容，不可留下空白或過短的段落。".to_string(),
        IssueRule::PlatformCompliance => format!(
            "依平台規範調整：行動呼籲句最多 {} 句，連結最多 {} 個。",
            profile.max_cta_lines, profile.max_links
        ),
        IssueRule::FaqSufficiency => format!(
            "在文末加入「## 常見問題」，至少 {} 組 Q:/A: 問答。",
            profile.required_faq_pairs
        ),
        IssueRule::ArticleTypeStructure => format!("依「{}」文章類型補齊必要的段落結構。", request.article_type),
        IssueRule::PlatformSafety => "刪除保證獲利、無風險等誇大或違反平台規範的用語。".to_string(),
        IssueRule::BilingualConsistency => "英文版本的段落與小標題要與中文一一對應，並以完整句子結尾。".to_string(),
        IssueRule::ScoreGate => format!(
            "標題與第一段自然帶入關鍵字「{}」，至少三個小標題，加入定義句與附來源的數據。",
            request.keyword
        ),
    }
}

/// 把问题列表转为去重后的修正指示
pub fn fix_instructions(
    issues: &[ValidationIssue],
    request: &GenerationRequest,
    profile: &PlatformProfile,
) -> Vec<String> {
    let mut seen = BTreeSet::new();
    issues
        .iter()
        .filter(|issue| issue.is_hard())
        .map(|issue| instruction_for(issue, request, profile))
        .filter(|instruction| seen.insert(instruction.clone()))
        .collect()
}

fn draft_json(draft: &ContentDraft) -> String {
    let value = serde_json::json!({
        "title": draft.title,
        "body": draft.body,
        "title_en": draft.title_en,
        "body_en": draft.body_en,
        "hashtags": draft.hashtags,
        "image_prompt": draft.image_prompt,
        "seo_title": draft.seo_title,
    });
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

/// 修订提示词：原始提示 + 当前草稿 + 问题与修正指示
pub fn revision_prompt(base_user: &str, draft: &ContentDraft, issues: &[ValidationIssue], instructions: &[String]) -> String {
    let mut prompt = format!("{}\n目前的草稿：\n{}\n\n檢查發現的問題：\n", base_user, draft_json(draft));
    for issue in issues.iter().filter(|i| i.is_hard()) {
        prompt.push_str(&format!("- {}\n", issue.message));
    }
    prompt.push_str("\n修正指示：\n");
    for instruction in instructions {
        prompt.push_str(&format!("- {}\n", instruction));
    }
    prompt.push_str("\n請以相同的 JSON 格式回傳完整的修正版本。");
    prompt
}

/// 可提取性强化提示词
pub fn extractability_prompt(base_user: &str, draft: &ContentDraft, issues: &[String]) -> String {
    let mut prompt = format!(
        "{}\n目前的草稿：\n{}\n\n請在不改變小標題與連結的前提下提高內容可被摘錄的程度：\n",
        base_user,
        draft_json(draft)
    );
    for issue in issues {
        prompt.push_str(&format!("- {}\n", issue));
    }
    prompt.push_str("第一段先直接給出答案，加入一句定義，並寫出幾句可以單獨引用的短句。\n請以相同的 JSON 格式回傳完整版本。");
    prompt
}
