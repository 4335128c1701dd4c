//! 残留清理与重复区块合并

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::analysis::similarity::normalize_for_compare;
use crate::analysis::text::{join_sections, split_sections, Section};
use crate::model::ContentDraft;

static KEY_PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();
static KEY_SUFFIX_REGEX: OnceLock<Regex> = OnceLock::new();

fn key_prefix_regex() -> &'static Regex {
    KEY_PREFIX_REGEX.get_or_init(|| {
        Regex::new(r#"^\s*\{?\s*"(?:title|body|title_en|body_en|hashtags|image_prompt|seo_title)"\s*:\s*"?"#)
            .unwrap()
    })
}

fn key_suffix_regex() -> &'static Regex {
    KEY_SUFFIX_REGEX.get_or_init(|| Regex::new(r#""\s*,?\s*\}?\s*$"#).unwrap())
}

fn is_artifact_line(trimmed: &str) -> bool {
    trimmed.starts_with("```") || matches!(trimmed, "{" | "}" | "\"" | "\"," | "}," | "\"}")
}

/// 清理单个字段中的序列化残留、代码围栏与多余空行
pub fn clean_text(text: &str) -> String {
    let unescaped = text.replace("\\n", "\n").replace("\\\"", "\"");

    let mut lines: Vec<String> = Vec::new();
    // 处于被拆散的 JSON 字符串值内部
    let mut in_value = false;
    for line in unescaped.lines() {
        let trimmed = line.trim();
        if is_artifact_line(trimmed) {
            continue;
        }

        let mut cleaned = line.trim_end().to_string();
        if key_prefix_regex().is_match(&cleaned) {
            cleaned = key_prefix_regex().replace(&cleaned, "").into_owned();
            in_value = true;
        }
        if in_value && key_suffix_regex().is_match(&cleaned) {
            cleaned = key_suffix_regex().replace(&cleaned, "").into_owned();
            in_value = false;
            if cleaned.trim().is_empty() {
                continue;
            }
        }

        let is_blank = cleaned.trim().is_empty();
        let previous_blank = lines.last().map(|l| l.is_empty()).unwrap_or(true);
        if is_blank {
            if !previous_blank {
                lines.push(String::new());
            }
        } else {
            lines.push(cleaned);
        }
    }

    lines.join("\n").trim().to_string()
}

/// 清理草稿全部文本字段
pub fn strip_artifacts(draft: &mut ContentDraft) {
    draft.title = clean_text(&draft.title);
    draft.seo_title = clean_text(&draft.seo_title);
    draft.body = clean_text(&draft.body);
    draft.title_en = clean_text(&draft.title_en);
    draft.body_en = clean_text(&draft.body_en);
    draft.image_prompt = clean_text(&draft.image_prompt);
    for tag in draft.hashtags.iter_mut() {
        *tag = tag.trim().to_string();
    }
    draft.hashtags.retain(|tag| !tag.is_empty());
}

fn section_key(section: &Section) -> Option<String> {
    let heading = section.heading.as_ref()?;
    if section.is_faq() {
        return Some(format!("{}:faq", heading.level));
    }
    Some(format!("{}:{}", heading.level, normalize_for_compare(&heading.text)))
}

/// 合并重复的 FAQ 区块与同名标题区块
///
/// 后出现的同名区块内容并入第一个区块，已存在的行不再重复加入。
pub fn collapse_duplicate_blocks(body: &str) -> String {
    let sections = split_sections(body);
    let mut merged: Vec<Section> = Vec::with_capacity(sections.len());
    let mut first_index: HashMap<String, usize> = HashMap::new();
    let mut collapsed = 0;

    for section in sections {
        let Some(key) = section_key(&section) else {
            merged.push(section);
            continue;
        };

        match first_index.get(&key) {
            Some(&index) => {
                collapsed += 1;
                let target = &mut merged[index];
                let existing: Vec<String> = target
                    .lines
                    .iter()
                    .map(|l| normalize_for_compare(l))
                    .filter(|l| !l.is_empty())
                    .collect();
                let additions: Vec<String> = section
                    .lines
                    .into_iter()
                    .filter(|l| {
                        let normalized = normalize_for_compare(l);
                        !normalized.is_empty() && !existing.contains(&normalized)
                    })
                    .collect();
                if !additions.is_empty() {
                    while target.lines.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
                        target.lines.pop();
                    }
                    target.lines.extend(additions);
                    target.lines.push(String::new());
                }
            }
            None => {
                first_index.insert(key, merged.len());
                merged.push(section);
            }
        }
    }

    if collapsed > 0 {
        tracing::debug!("合并了 {} 个重复区块", collapsed);
    }
    join_sections(&merged).trim_end().to_string()
}
