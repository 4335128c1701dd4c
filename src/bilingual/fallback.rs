//! 词表驱动的结构兜底
//!
//! 完全不调用补全服务：按中文主版本的标题逐个映射出英文标题，
//! 每个章节填入与原章节长度相当的英文占位段落，保证结构与长度一致。
//! 产出的内容会被标记为合成内容。

use crate::analysis::text::{find_urls, split_sections, visible_len};

/// 标题词表（中文片段 → 英文）
const GLOSSARY: &[(&str, &str)] = &[
    ("常見問題", "FAQ"),
    ("問與答", "FAQ"),
    ("檢查清單", "Checklist"),
    ("注意事項", "Things to Watch"),
    ("常見錯誤", "Common Mistakes"),
    ("什麼是", "What It Is"),
    ("為什麼", "Why It Matters"),
    ("如何", "How To"),
    ("前言", "Introduction"),
    ("介紹", "Introduction"),
    ("背景", "Background"),
    ("步驟", "Steps"),
    ("流程", "Process"),
    ("方法", "Methods"),
    ("策略", "Strategy"),
    ("工具", "Tools"),
    ("比較", "Comparison"),
    ("差異", "Differences"),
    ("優點", "Advantages"),
    ("缺點", "Drawbacks"),
    ("趨勢", "Trends"),
    ("展望", "Outlook"),
    ("未來", "The Road Ahead"),
    ("案例", "Case Study"),
    ("成果", "Results"),
    ("結果", "Results"),
    ("成效", "Outcomes"),
    ("數據", "Data"),
    ("分析", "Analysis"),
    ("預算", "Budget"),
    ("成本", "Cost"),
    ("挑戰", "Challenges"),
    ("建議", "Recommendations"),
    ("重點", "Key Points"),
    ("清單", "Checklist"),
    ("總結", "Summary"),
    ("結論", "Conclusion"),
    ("結語", "Final Thoughts"),
];

/// 无法映射时使用的通用标题前缀
pub const GENERIC_HEADING_PREFIX: &str = "Key Point";

/// 合成段落的句子池
const FILLER_SENTENCES: &[&str] = &[
    "This section summarizes the main ideas covered in the original article.",
    "It explains the practical considerations readers should keep in mind.",
    "The points below are organized so they can be applied step by step.",
    "Each recommendation should be adjusted to the reader's own situation.",
    "Reviewing the results regularly helps keep the plan on track.",
    "Clear goals and simple measurements make progress easier to follow.",
];

/// 用词表翻译标题：取命中的最长词条
pub fn glossary_heading(text: &str) -> Option<String> {
    GLOSSARY
        .iter()
        .filter(|(zh, _)| text.contains(zh))
        .max_by_key(|(zh, _)| zh.chars().count())
        .map(|(_, en)| en.to_string())
}

pub fn generic_heading(index: usize) -> String {
    format!("{} {}", GENERIC_HEADING_PREFIX, index + 1)
}

pub fn is_generic_heading(text: &str) -> bool {
    let text = text.trim();
    text.starts_with(GENERIC_HEADING_PREFIX)
        && text[GENERIC_HEADING_PREFIX.len()..]
            .trim()
            .chars()
            .all(|c| c.is_ascii_digit())
}

/// 「看起来像模板」：通用标题至少 3 个，或占全部标题一半以上
pub fn looks_templated(body: &str) -> bool {
    let headings = crate::analysis::structure::extract_headings(body);
    if headings.is_empty() {
        return false;
    }
    let generic = headings.iter().filter(|h| is_generic_heading(&h.text)).count();
    generic >= 3 || generic * 2 > headings.len()
}

fn filler_paragraph(target_len: usize, seed: usize) -> String {
    let mut sentences = Vec::new();
    let mut length = 0;
    let mut index = seed;
    while length < target_len.max(1) {
        let sentence = FILLER_SENTENCES[index % FILLER_SENTENCES.len()];
        length += visible_len(sentence);
        sentences.push(sentence);
        index += 1;
    }
    sentences.join(" ")
}

/// 从中文主版本生成结构一致的英文兜底版本
pub fn structural_fallback(primary: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut heading_index = 0;

    for (position, section) in split_sections(primary).iter().enumerate() {
        let content_len = section.effective_len();
        if let Some(heading) = &section.heading {
            let title = glossary_heading(&heading.text).unwrap_or_else(|| generic_heading(heading_index));
            heading_index += 1;
            let heading_line = format!("{} {}", "#".repeat(heading.level), title);
            if content_len == 0 {
                blocks.push(heading_line);
            } else {
                blocks.push(format!("{}\n{}", heading_line, filler_paragraph(content_len, position)));
            }
        } else if content_len > 0 {
            blocks.push(filler_paragraph(content_len, position));
        }
    }

    for url in find_urls(primary) {
        blocks.push(format!("Learn more: {}", url.url));
    }

    blocks.join("\n\n")
}
