//! 不调用补全服务的英文版本修补

use super::consistency::{is_leaked_line, tail_problem, DANGLING_CONJUNCTIONS};
use super::fallback::{generic_heading, glossary_heading};
use crate::analysis::text::{find_urls, is_heading_line, paragraphs, parse_heading, split_sections, strip_urls};

const DANGLING_TAIL: &[char] = &[',', ':', ';', '-', '–', '—', '、', '，', '：', '；', '(', '[', ' '];

/// 按中文主版本的标题重新分配英文段落
///
/// 英文段落数不少于主版本标题数时恢复全部 n 个标题，否则恢复 n-1 个。
/// 英文原有标题足够时按位置沿用，否则依次取词表翻译、通用标题。
pub fn patch_headings(primary: &str, secondary: &str) -> String {
    let primary_sections = split_sections(primary);
    let primary_heads: Vec<(usize, String, usize)> = primary_sections
        .iter()
        .filter_map(|section| {
            let heading = section.heading.as_ref()?;
            let weight = paragraphs(&section.content()).len().max(1);
            Some((heading.level, heading.text.clone(), weight))
        })
        .collect();
    if primary_heads.is_empty() {
        return secondary.to_string();
    }
    let primary_has_lead = primary_sections
        .first()
        .map(|s| s.heading.is_none() && s.effective_len() > 0)
        .unwrap_or(false);

    // 拆出英文已有的标题名与正文段落
    let mut names: Vec<String> = Vec::new();
    let mut contents: Vec<String> = Vec::new();
    for paragraph in paragraphs(secondary) {
        let mut body_lines = Vec::new();
        for line in paragraph.lines() {
            match parse_heading(line) {
                Some((_, text)) => names.push(text),
                None => body_lines.push(line),
            }
        }
        if !body_lines.is_empty() {
            contents.push(body_lines.join("\n"));
        }
    }

    let n = primary_heads.len();
    let lead_count = usize::from(primary_has_lead && contents.len() > n.saturating_sub(1));
    let available = contents.len() - lead_count;
    let target = if available >= n { n } else { n.saturating_sub(1).max(1) };

    // 按主版本各章节段落数的比例切分
    let weights: Vec<usize> = primary_heads[..target].iter().map(|h| h.2).collect();
    let total_weight: usize = weights.iter().sum();
    let mut bounds = Vec::with_capacity(target);
    let mut cumulative = 0;
    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight;
        let mut end = (available * cumulative + total_weight / 2) / total_weight.max(1);
        let floor = bounds.last().copied().unwrap_or(0);
        if available >= target {
            end = end.max(i + 1).min(available - (target - i - 1));
        }
        bounds.push(end.max(floor).min(available));
    }
    if let Some(last) = bounds.last_mut() {
        *last = available;
    }

    // 英文标题少于目标数时无法判断缺的是哪一个，不按位置沿用
    let names_by_position = names.len() >= target;

    let mut blocks: Vec<String> = contents[..lead_count].to_vec();
    let mut start = 0;
    for (i, end) in bounds.iter().enumerate() {
        let (level, text, _) = &primary_heads[i];
        let name = names_by_position
            .then(|| names.get(i).cloned())
            .flatten()
            .or_else(|| glossary_heading(text))
            .unwrap_or_else(|| generic_heading(i));
        let heading_line = format!("{} {}", "#".repeat(*level), name);
        let section_body = contents[lead_count + start..lead_count + end].join("\n\n");
        if section_body.is_empty() {
            blocks.push(heading_line);
        } else {
            blocks.push(format!("{}\n{}", heading_line, section_body));
        }
        start = *end;
    }

    tracing::debug!("英文标题修补: {} 个标题, {} 个段落", target, available);
    blocks.join("\n\n")
}

/// 去掉截断结尾的连接符号与连词；以介词结尾的句子保持原样
fn trim_dangling(line: &str) -> String {
    let mut current = line.trim_end().trim_end_matches(DANGLING_TAIL).to_string();
    loop {
        let last = current.rsplit(char::is_whitespace).next().unwrap_or_default();
        if current.contains(char::is_whitespace) && DANGLING_CONJUNCTIONS.contains(&last.to_lowercase().as_str()) {
            let cut = current.len() - last.len();
            current = current[..cut].trim_end().trim_end_matches(DANGLING_TAIL).to_string();
        } else {
            break;
        }
    }
    current
}

fn close_brackets(line: &str) -> String {
    let mut out = line.to_string();
    for (open, close) in [('(', ')'), ('[', ']'), ('（', '）')] {
        let missing = line.matches(open).count().saturating_sub(line.matches(close).count());
        for _ in 0..missing {
            out.push(close);
        }
    }
    out
}

/// 修补结尾、中文残留行与链接数量
pub fn patch_tail(primary: &str, secondary: &str) -> String {
    let mut lines: Vec<String> = secondary
        .lines()
        .filter(|line| !is_leaked_line(line))
        .map(str::to_string)
        .collect();

    // 链接数量不一致时以主版本为准重新附上
    let primary_urls: Vec<String> = find_urls(primary).into_iter().map(|m| m.url).collect();
    let mut expected = primary_urls.clone();
    expected.sort();
    let mut present: Vec<String> = find_urls(&lines.join("\n")).into_iter().map(|m| m.url).collect();
    present.sort();
    let sync_urls = expected != present;
    if sync_urls {
        lines = lines
            .into_iter()
            .filter_map(|line| {
                if find_urls(&line).is_empty() {
                    return Some(line);
                }
                let stripped = strip_urls(&line).trim_end().trim_end_matches(DANGLING_TAIL).to_string();
                stripped.chars().any(char::is_alphanumeric).then_some(stripped)
            })
            .collect();
    }

    while lines.last().map(|l| l.trim().is_empty() || is_heading_line(l)).unwrap_or(false) {
        lines.pop();
    }

    if let Some(last) = lines.last_mut() {
        if tail_problem(last).is_some() {
            let mut fixed = close_brackets(&trim_dangling(last));
            if tail_problem(&fixed).is_some() {
                fixed.push('.');
            }
            *last = fixed;
        }
    }

    if sync_urls {
        for url in primary_urls {
            lines.push(String::new());
            lines.push(format!("Learn more: {}", url));
        }
    }

    lines.join("\n").trim().to_string()
}
