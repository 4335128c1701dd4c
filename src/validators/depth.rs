//! 结构深度校验

use super::{ValidationContext, Validator};
use crate::analysis::text::{split_sections, Section};
use crate::config::constants;
use crate::model::{ContentDraft, IssueRule, ValidationIssue};

/// 参与深度检查的章节（下标, 章节）
///
/// 跳过无标题的导语、FAQ 章节及其子标题，以及直接接子标题的父级容器。
pub fn checked_sections(sections: &[Section]) -> Vec<(usize, &Section)> {
    let mut result = Vec::new();
    let mut faq_level: Option<usize> = None;

    for (index, section) in sections.iter().enumerate() {
        let Some(heading) = &section.heading else {
            continue;
        };

        if let Some(level) = faq_level {
            if heading.level > level {
                continue;
            }
            faq_level = None;
        }
        if section.is_faq() {
            faq_level = Some(heading.level);
            continue;
        }

        let is_container = section.effective_len() == 0
            && sections
                .get(index + 1)
                .and_then(|next| next.heading.as_ref())
                .map(|next| next.level > heading.level)
                .unwrap_or(false);
        if is_container {
            continue;
        }

        result.push((index, section));
    }
    result
}

pub fn is_thin(section: &Section) -> bool {
    section.effective_len() < constants::MIN_SECTION_CHARS
}

/// 结构深度校验器
pub struct StructuralDepth;

impl Validator for StructuralDepth {
    fn name(&self) -> &'static str {
        "structural_depth"
    }

    fn validate(&self, draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let sections = split_sections(&draft.body);
        let checked = checked_sections(&sections);
        if checked.is_empty() {
            return Vec::new();
        }

        let mut issues = Vec::new();
        let mut thin = 0;
        for (_, section) in &checked {
            let heading = section.heading_text().unwrap_or_default();
            let len = section.effective_len();
            if len == 0 {
                thin += 1;
                issues.push(ValidationIssue::hard(
                    IssueRule::StructuralDepth,
                    format!("章节「{}」没有内容", heading),
                ));
            } else if is_thin(section) {
                thin += 1;
                issues.push(ValidationIssue::soft(
                    IssueRule::StructuralDepth,
                    format!("章节「{}」内容过少（{} 字）", heading, len),
                ));
            }
        }

        let ratio = thin as f64 / checked.len() as f64;
        if ratio > constants::MAX_THIN_SECTION_RATIO {
            issues.push(ValidationIssue::hard(
                IssueRule::StructuralDepth,
                format!("单薄章节比例过高（{}/{}）", thin, checked.len()),
            ));
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

    fn draft(body: &str) -> ContentDraft {
        ContentDraft {
            body: body.to_string(),
            ..Default::default()
        }
    }

    const DEEP: &str = "這一段內容足夠長，詳細說明了企業導入自動化流程時應該注意的每一個步驟與風險，並提供實際可行的建議。";

    #[test]
    fn test_empty_section_is_hard() {
        let body = format!("## 第一節\n{}\n\n## 第二節\n\n## 第三節\n{}\n\n## 第四節\n{}", DEEP, DEEP, DEEP);
        let issues = StructuralDepth.validate(&draft(&body), &ctx());
        assert!(issues.iter().any(|i| i.is_hard() && i.message.contains("第二節")));
    }

    #[test]
    fn test_thin_ratio_bound() {
        let body = format!("## 一\n短。\n\n## 二\n也短。\n\n## 三\n{}", DEEP);
        let issues = StructuralDepth.validate(&draft(&body), &ctx());
        assert!(issues.iter().any(|i| i.is_hard() && i.message.contains("比例")));
    }

    #[test]
    fn test_faq_and_container_sections_are_exempt() {
        let body = format!(
            "## 主題\n### 子題一\n{}\n### 子題二\n{}\n\n## 常見問題\nQ: 多久？\nA: 兩週。",
            DEEP, DEEP
        );
        let issues = StructuralDepth.validate(&draft(&body), &ctx());
        assert!(issues.is_empty(), "{:?}", issues);
    }
}
