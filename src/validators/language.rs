//! 语言纯度校验
//!
//! 主语言字段（繁体中文）检测简体字迹象；次语言字段（英文）检测全角标点与汉字；
//! 所有字段检测上游解析失败残留的序列化键。

use std::sync::OnceLock;

use regex::Regex;

use super::{ValidationContext, Validator};
use crate::analysis::text::han_count;
use crate::model::{ContentDraft, IssueRule, ValidationIssue};

/// 简体特有字（权重 1）
const SIMPLIFIED_CHARS: &str = "这们说为时会来个国学对发过还后进种样现产经实问题见应开关体长东车书买卖头号门间点认让论设证语读谁请转运选边网络软数据质务户级优营销质区观传写亲际杂华";

/// 大陆用语（权重 2）
const SIMPLIFIED_STRONG: &[&str] = &[
    "软件", "视频", "网络", "数据", "质量", "用户", "服务器", "优化", "营销", "信息化", "博客",
    "默认", "屏幕", "程序员", "鼠标", "硬盘", "打印机",
];

/// 繁体对应字（原生标记）
const TRADITIONAL_CHARS: &str = "這們說為時會來個國學對發過還後進種樣現產經實問題見應開關體長東車書買賣頭號門間點認讓論設證語讀誰請轉運選邊網絡軟數據質務戶級優營銷區觀傳寫親際雜華";

/// 全角 CJK 标点
const FULLWIDTH_PUNCTUATION: &[char] = &[
    '，', '。', '、', '；', '：', '！', '？', '「', '」', '『', '』', '（', '）', '【', '】', '《', '》',
];

const STRONG_HINT_WEIGHT: usize = 2;
const HINT_WEIGHT_THRESHOLD: usize = 4;
const HINT_WEIGHT_WITH_NATIVE: usize = 2;
const MAX_NATIVE_TOKENS_FOR_LOW_WEIGHT: usize = 1;
const MAX_HAN_IN_SECONDARY: usize = 1;

static LEAKED_KEY_REGEX: OnceLock<Regex> = OnceLock::new();

fn leaked_key_regex() -> &'static Regex {
    LEAKED_KEY_REGEX.get_or_init(|| {
        Regex::new(r#""(?:title|body|title_en|body_en|hashtags|image_prompt|seo_title)"\s*:|\{\s*"|\\n"#)
            .unwrap()
    })
}

/// 简体迹象加权计数
pub fn simplified_hint_weight(text: &str) -> usize {
    let strong: usize = SIMPLIFIED_STRONG
        .iter()
        .map(|word| text.matches(word).count() * STRONG_HINT_WEIGHT)
        .sum();
    let weak = text.chars().filter(|c| SIMPLIFIED_CHARS.contains(*c)).count();
    strong + weak
}

/// 繁体原生字计数
pub fn traditional_token_count(text: &str) -> usize {
    text.chars().filter(|c| TRADITIONAL_CHARS.contains(*c)).count()
}

/// 主语言文本是否被简体污染
pub fn is_simplified_contaminated(text: &str) -> bool {
    let weight = simplified_hint_weight(text);
    if weight >= HINT_WEIGHT_THRESHOLD {
        return true;
    }
    weight >= HINT_WEIGHT_WITH_NATIVE && traditional_token_count(text) <= MAX_NATIVE_TOKENS_FOR_LOW_WEIGHT
}

/// 次语言文本是否混入中文
pub fn is_cjk_contaminated(text: &str) -> bool {
    text.chars().any(|c| FULLWIDTH_PUNCTUATION.contains(&c)) || han_count(text) > MAX_HAN_IN_SECONDARY
}

pub fn has_leaked_keys(text: &str) -> bool {
    leaked_key_regex().is_match(text)
}

/// 语言纯度校验器
pub struct LanguagePurity;

impl Validator for LanguagePurity {
    fn name(&self) -> &'static str {
        "language_purity"
    }

    fn validate(&self, draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        let primary = [
            ("title", draft.title.as_str()),
            ("seo_title", draft.seo_title.as_str()),
            ("body", draft.body.as_str()),
        ];
        for (field, text) in primary {
            if is_simplified_contaminated(text) {
                issues.push(ValidationIssue::hard(
                    IssueRule::LanguagePurity,
                    format!(
                        "{} 含有简体用字（加权 {}，繁体字 {}）",
                        field,
                        simplified_hint_weight(text),
                        traditional_token_count(text)
                    ),
                ));
            }
        }

        let secondary = [
            ("title_en", draft.title_en.as_str()),
            ("body_en", draft.body_en.as_str()),
            ("image_prompt", draft.image_prompt.as_str()),
        ];
        for (field, text) in secondary {
            if !text.trim().is_empty() && is_cjk_contaminated(text) {
                issues.push(ValidationIssue::hard(
                    IssueRule::LanguagePurity,
                    format!("{} 混入中文字符或全角标点", field),
                ));
            }
        }

        let all_fields = primary.iter().chain(secondary.iter());
        for (field, text) in all_fields {
            if has_leaked_keys(text) {
                issues.push(ValidationIssue::hard(
                    IssueRule::LanguagePurity,
                    format!("{} 残留序列化片段", field),
                ));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArticleType, ContentVariant, LinkPolicyContext, Platform};

    fn ctx() -> ValidationContext {
        ValidationContext::new(
            LinkPolicyContext::new(Platform::Blog, ContentVariant::Default),
            ArticleType::General,
            2026,
        )
    }

    #[test]
    fn test_traditional_text_is_clean() {
        assert!(!is_simplified_contaminated("這是一篇關於數位轉型的文章，說明企業如何開始。"));
    }

    #[test]
    fn test_simplified_text_is_flagged() {
        assert!(is_simplified_contaminated("这是一篇关于软件的文章"));
        // 低权重但缺少繁体字
        assert!(is_simplified_contaminated("软件"));
        // 低权重且繁体字充足
        assert!(!is_simplified_contaminated("這個產品搭配软件"));
    }

    #[test]
    fn test_secondary_field_contamination() {
        assert!(is_cjk_contaminated("Hello，world"));
        assert!(is_cjk_contaminated("Digital 轉型"));
        assert!(!is_cjk_contaminated("Plain English body."));
    }

    #[test]
    fn test_validator_reports_leaked_keys() {
        let draft = ContentDraft {
            title: "標題".to_string(),
            body: "{\"title\": \"標題\", \"body\": \"內文".to_string(),
            ..Default::default()
        };
        let issues = LanguagePurity.validate(&draft, &ctx());
        assert!(issues.iter().any(|i| i.message.contains("body 残留序列化片段")));
        assert!(issues.iter().all(|i| i.is_hard()));
    }

    #[test]
    fn test_empty_secondary_fields_are_skipped() {
        let draft = ContentDraft {
            title: "數位行銷入門".to_string(),
            body: "這是內容。".to_string(),
            ..Default::default()
        };
        assert!(LanguagePurity.validate(&draft, &ctx()).is_empty());
    }
}
