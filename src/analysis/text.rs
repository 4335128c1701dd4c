//! 文本基础工具
//!
//! 所有分析器、校验器与修复器共享的底层切分与识别函数：URL 抽取、汉字识别、
//! 段落/章节切分、句子切分、年份标记识别。全部为纯函数。

use std::sync::OnceLock;

use regex::Regex;

static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static HEADING_REGEX: OnceLock<Regex> = OnceLock::new();
static LIST_MARKER_REGEX: OnceLock<Regex> = OnceLock::new();
static DIGIT_RUN_REGEX: OnceLock<Regex> = OnceLock::new();
static FAQ_HEADING_REGEX: OnceLock<Regex> = OnceLock::new();
static QUESTION_LINE_REGEX: OnceLock<Regex> = OnceLock::new();
static ANSWER_LINE_REGEX: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r#"https?://[^\s<>()\[\]"'，。！？、；：「」『』（）【】]+"#).unwrap()
    })
}

fn heading_regex() -> &'static Regex {
    HEADING_REGEX.get_or_init(|| Regex::new(r"^\s{0,3}(#{1,6})\s+(.+?)\s*#*\s*$").unwrap())
}

fn list_marker_regex() -> &'static Regex {
    LIST_MARKER_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?:[-*+•·]|\d{1,3}[.)、]|[（(]\d{1,3}[)）]|\[[ xX]\])\s*").unwrap()
    })
}

fn digit_run_regex() -> &'static Regex {
    DIGIT_RUN_REGEX.get_or_init(|| Regex::new(r"\d+").unwrap())
}

fn faq_heading_regex() -> &'static Regex {
    FAQ_HEADING_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(常見問題|問與答|faq|q\s*&\s*a|frequently asked)").unwrap()
    })
}

fn question_line_regex() -> &'static Regex {
    QUESTION_LINE_REGEX
        .get_or_init(|| Regex::new(r"^\s*(?:\*\*)?\s*(?:Q\d*|問)\s*[:：.]").unwrap())
}

fn answer_line_regex() -> &'static Regex {
    ANSWER_LINE_REGEX.get_or_init(|| Regex::new(r"^\s*(?:\*\*)?\s*(?:A\d*|答)\s*[:：.]").unwrap())
}

/// 文本中的一个 URL 命中
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatch {
    pub start: usize,
    pub end: usize,
    pub url: String,
}

/// 抽取所有 URL，去掉尾部的半角标点
pub fn find_urls(text: &str) -> Vec<UrlMatch> {
    url_regex()
        .find_iter(text)
        .map(|m| {
            let raw = m.as_str();
            let trimmed = raw.trim_end_matches(|c: char| ".,;:!?*_~`".contains(c));
            UrlMatch {
                start: m.start(),
                end: m.start() + trimmed.len(),
                url: trimmed.to_string(),
            }
        })
        .filter(|m| m.url.len() > "https://".len())
        .collect()
}

pub fn contains_url(text: &str) -> bool {
    !find_urls(text).is_empty()
}

/// 删除文本中的所有 URL（用于相似度比较）
pub fn strip_urls(text: &str) -> String {
    url_regex().replace_all(text, "").into_owned()
}

/// 是否为汉字（CJK 统一表意文字及扩展 A、兼容区）
pub fn is_han(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}' | '\u{3400}'..='\u{4dbf}' | '\u{f900}'..='\u{faff}')
}

pub fn han_count(text: &str) -> usize {
    text.chars().filter(|c| is_han(*c)).count()
}

/// 不计空白的字符数
pub fn visible_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Markdown 标题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    pub line_index: usize,
}

/// 解析单行标题，返回 (级别, 标题文本)
pub fn parse_heading(line: &str) -> Option<(usize, String)> {
    let caps = heading_regex().captures(line)?;
    let level = caps.get(1)?.as_str().len();
    let text = caps.get(2)?.as_str().trim().to_string();
    if text.is_empty() {
        return None;
    }
    Some((level, text))
}

pub fn is_heading_line(line: &str) -> bool {
    parse_heading(line).is_some()
}

pub fn is_faq_heading(text: &str) -> bool {
    faq_heading_regex().is_match(text)
}

pub fn is_question_line(line: &str) -> bool {
    question_line_regex().is_match(line)
}

pub fn is_answer_line(line: &str) -> bool {
    answer_line_regex().is_match(line)
}

/// 去掉行首的列表标记（`-`、`*`、`1.`、`（1）`、`[ ]` 等）
pub fn strip_list_marker(line: &str) -> &str {
    match list_marker_regex().find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

pub fn is_list_item(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("---") || trimmed.starts_with("***") {
        return false;
    }
    list_marker_regex().is_match(line) && !strip_list_marker(line).trim().is_empty()
}

/// 按空行切分段落（保留段内换行）
pub fn paragraphs(body: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in body.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                result.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        result.push(current.join("\n"));
    }
    result
}

/// 首个非标题段落（导语）
pub fn lead_paragraph(body: &str) -> Option<String> {
    paragraphs(body).into_iter().find(|p| {
        let first = p.lines().next().unwrap_or_default();
        !is_heading_line(first)
    })
}

/// 以标题为界的章节
///
/// 第一个章节可能没有标题（导语部分）。`split_sections` 与 `join_sections`
/// 互为逆操作（末尾换行除外）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: Option<Heading>,
    pub heading_line: Option<String>,
    pub lines: Vec<String>,
}

impl Section {
    /// 章节正文（不含标题行）
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    pub fn heading_text(&self) -> Option<&str> {
        self.heading.as_ref().map(|h| h.text.as_str())
    }

    pub fn is_faq(&self) -> bool {
        self.heading_text().map(is_faq_heading).unwrap_or(false)
    }

    /// 有效内容字数：去掉列表标记与空白后的字符数
    pub fn effective_len(&self) -> usize {
        self.lines
            .iter()
            .map(|line| visible_len(strip_list_marker(line)))
            .sum()
    }
}

pub fn split_sections(body: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        heading: None,
        heading_line: None,
        lines: Vec::new(),
    };

    for (index, line) in body.lines().enumerate() {
        if let Some((level, text)) = parse_heading(line) {
            if current.heading.is_some() || !current.lines.is_empty() {
                sections.push(current);
            }
            current = Section {
                heading: Some(Heading {
                    level,
                    text,
                    line_index: index,
                }),
                heading_line: Some(line.to_string()),
                lines: Vec::new(),
            };
        } else {
            current.lines.push(line.to_string());
        }
    }

    if current.heading.is_some() || !current.lines.is_empty() {
        sections.push(current);
    }
    sections
}

pub fn join_sections(sections: &[Section]) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for section in sections {
        if let Some(heading_line) = &section.heading_line {
            lines.push(heading_line);
        }
        lines.extend(section.lines.iter().map(String::as_str));
    }
    lines.join("\n")
}

/// 句子切分（中英文终止符）
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' {
            push_sentence(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        let terminal = matches!(c, '。' | '！' | '？' | '!' | '?')
            || (c == '.' && chars.get(i + 1).map_or(true, |n| n.is_whitespace()));
        if terminal {
            push_sentence(&mut sentences, &mut current);
        }
    }
    push_sentence(&mut sentences, &mut current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// 年份标记：四位数字 19xx/20xx，前后不与其他数字相连
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearToken {
    pub start: usize,
    /// 结束位置（若紧跟「年」则包含该字）
    pub end: usize,
    pub year: i32,
}

pub fn find_years(text: &str) -> Vec<YearToken> {
    digit_run_regex()
        .find_iter(text)
        .filter(|m| m.as_str().len() == 4)
        .filter_map(|m| {
            let year: i32 = m.as_str().parse().ok()?;
            if !(1900..=2099).contains(&year) {
                return None;
            }
            let end = if text[m.end()..].starts_with('年') {
                m.end() + '年'.len_utf8()
            } else {
                m.end()
            };
            Some(YearToken {
                start: m.start(),
                end,
                year,
            })
        })
        .collect()
}
