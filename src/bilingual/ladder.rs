//! 双语修复阶梯
//!
//! 每一级只有在上一级的重新校验仍未通过时才会执行：
//!
//! 1. 结构化（JSON）整篇重译
//! 2. 标题结构修补（不调用补全服务）
//! 3. 结尾标点修补（不调用补全服务）
//! 4. 纯文本整篇重译
//! 5. 分块重译，块大小逐级缩小
//! 6. 词表驱动的结构兜底，标记为合成内容
//!
//! 兜底结果「看起来像模板」时，在接受之前再做一次最小块的分块重译。

use serde::Deserialize;

use super::consistency::check_consistency;
use super::fallback::{glossary_heading, looks_templated, structural_fallback};
use super::patch::{patch_headings, patch_tail};
use crate::analysis::text::{han_count, paragraphs};
use crate::error::{GateError, GateResult};
use crate::model::{extract_json_object, strip_code_fences, ContentDraft};
use crate::provider::ModelRouter;

const STRUCTURED_SYSTEM_PROMPT: &str = "You are a professional translator. Translate the Traditional Chinese article into natural, fluent English. \
Keep every markdown heading, paragraph break, list item and URL in the same place. \
Reply with a single JSON object: {\"title_en\": \"...\", \"body_en\": \"...\"}.";

const PLAIN_SYSTEM_PROMPT: &str = "You are a professional translator. Translate the Traditional Chinese text into natural, fluent English. \
Keep every markdown heading, paragraph break, list item and URL in the same place. \
Reply with the English text only, without commentary.";

/// 合成内容标记
pub const SYNTHETIC_META_KEY: &str = "bilingual_synthetic";
const FALLBACK_TITLE: &str = "Overview";

/// 阶梯中最终被接受的一级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderStep {
    /// 原有英文版本已经一致
    Accepted,
    Retranslation,
    HeadingPatch,
    TailPatch,
    PlainRetranslation,
    ChunkedRetranslation(usize),
    StructuralFallback,
}

impl LadderStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            LadderStep::Accepted => "accepted",
            LadderStep::Retranslation => "retranslation",
            LadderStep::HeadingPatch => "heading_patch",
            LadderStep::TailPatch => "tail_patch",
            LadderStep::PlainRetranslation => "plain_retranslation",
            LadderStep::ChunkedRetranslation(_) => "chunked_retranslation",
            LadderStep::StructuralFallback => "structural_fallback",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranslationPayload {
    #[serde(default)]
    title_en: String,
    #[serde(default)]
    body_en: String,
}

/// 按段落边界切块，单个超长段落独占一块
pub fn split_chunks(body: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0;

    for paragraph in paragraphs(body) {
        let len = paragraph.chars().count();
        if !current.is_empty() && current_len + len > max_chars {
            chunks.push(current.join("\n\n"));
            current.clear();
            current_len = 0;
        }
        current_len += len;
        current.push(paragraph);
    }
    if !current.is_empty() {
        chunks.push(current.join("\n\n"));
    }
    chunks
}

/// 原样通过或经两步修补后通过时返回可接受的文本
fn settle(primary: &str, candidate: &str) -> Option<String> {
    if candidate.trim().is_empty() {
        return None;
    }
    if check_consistency(primary, candidate).passed() {
        return Some(candidate.to_string());
    }
    let patched = patch_tail(primary, &patch_headings(primary, candidate));
    check_consistency(primary, &patched).passed().then_some(patched)
}

/// 双语修复阶梯
pub struct BilingualLadder<'a> {
    router: &'a ModelRouter,
    chunk_sizes: &'a [usize],
}

impl<'a> BilingualLadder<'a> {
    pub fn new(router: &'a ModelRouter, chunk_sizes: &'a [usize]) -> Self {
        Self { router, chunk_sizes }
    }

    async fn translate_structured(&self, title: &str, body: &str) -> GateResult<TranslationPayload> {
        let user = format!("標題：\n{}\n\n內文：\n{}", title, body);
        let raw = self.router.complete(STRUCTURED_SYSTEM_PROMPT, &user).await?;
        let cleaned = strip_code_fences(&raw);
        let json = extract_json_object(&cleaned)
            .ok_or_else(|| GateError::Parse("翻译结果中没有 JSON 对象".to_string()))?;
        let payload: TranslationPayload = serde_json::from_str(json)?;
        if payload.body_en.trim().is_empty() {
            return Err(GateError::Parse("翻译结果缺少 body_en".to_string()));
        }
        Ok(payload)
    }

    async fn translate_plain(&self, text: &str) -> GateResult<String> {
        let raw = self.router.complete(PLAIN_SYSTEM_PROMPT, text).await?;
        Ok(strip_code_fences(&raw).trim().to_string())
    }

    async fn translate_chunked(&self, body: &str, size: usize) -> GateResult<String> {
        let chunks = split_chunks(body, size);
        tracing::debug!("分块重译: 块大小 {}，共 {} 块", size, chunks.len());
        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            translated.push(self.translate_plain(chunk).await?);
        }
        Ok(translated.join("\n\n"))
    }

    /// 致命的服务拒绝会关闭后续所有需要调用服务的步骤
    fn provider_still_usable(step: &str, error: &GateError) -> bool {
        tracing::warn!("双语修复步骤 {} 调用失败: {}", step, error);
        !matches!(error, GateError::ProviderRejection { kind, .. } if kind.is_fatal())
    }

    fn accept(draft: &mut ContentDraft, body: String, step: LadderStep) -> LadderStep {
        draft.body_en = body;
        draft.set_meta(SYNTHETIC_META_KEY, step == LadderStep::StructuralFallback);
        metrics::counter!("content_gate_bilingual_steps_total", "step" => step.as_str()).increment(1);
        tracing::info!("双语版本在 {} 步骤通过一致性校验", step.as_str());
        step
    }

    /// 让草稿的英文版本与中文主版本一致，返回最终被接受的步骤
    pub async fn synchronize(&self, draft: &mut ContentDraft) -> GateResult<LadderStep> {
        let primary = draft.body.clone();
        if draft.has_secondary() && check_consistency(&primary, &draft.body_en).passed() {
            return Ok(LadderStep::Accepted);
        }

        let mut provider_usable = true;
        let mut candidate = draft.body_en.clone();

        // 1. 结构化整篇重译
        match self.translate_structured(&draft.title, &primary).await {
            Ok(payload) => {
                if !payload.title_en.trim().is_empty() {
                    draft.title_en = payload.title_en.trim().to_string();
                }
                candidate = payload.body_en.trim().to_string();
                if check_consistency(&primary, &candidate).passed() {
                    return Ok(Self::accept(draft, candidate, LadderStep::Retranslation));
                }
            }
            Err(error) => provider_usable = Self::provider_still_usable("retranslation", &error),
        }

        if !candidate.trim().is_empty() {
            // 2. 标题结构修补
            if check_consistency(&primary, &candidate).heading_mismatch() {
                candidate = patch_headings(&primary, &candidate);
                if check_consistency(&primary, &candidate).passed() {
                    return Ok(Self::accept(draft, candidate, LadderStep::HeadingPatch));
                }
            }

            // 3. 结尾修补
            candidate = patch_tail(&primary, &candidate);
            if check_consistency(&primary, &candidate).passed() {
                return Ok(Self::accept(draft, candidate, LadderStep::TailPatch));
            }
        }

        // 4. 纯文本整篇重译
        if provider_usable {
            match self.translate_plain(&primary).await {
                Ok(text) => {
                    if let Some(accepted) = settle(&primary, &text) {
                        return Ok(Self::accept(draft, accepted, LadderStep::PlainRetranslation));
                    }
                }
                Err(error) => provider_usable = Self::provider_still_usable("plain_retranslation", &error),
            }
        }

        // 5. 分块重译
        if provider_usable {
            for &size in self.chunk_sizes {
                match self.translate_chunked(&primary, size).await {
                    Ok(text) => {
                        if let Some(accepted) = settle(&primary, &text) {
                            return Ok(Self::accept(draft, accepted, LadderStep::ChunkedRetranslation(size)));
                        }
                    }
                    Err(error) => {
                        provider_usable = Self::provider_still_usable("chunked_retranslation", &error);
                        if !provider_usable {
                            break;
                        }
                    }
                }
            }
        }

        // 6. 结构兜底
        let fallback = structural_fallback(&primary);
        if looks_templated(&fallback) && provider_usable {
            if let Some(&smallest) = self.chunk_sizes.iter().min() {
                tracing::info!("兜底结果像模板，再尝试一次块大小 {} 的分块重译", smallest);
                if let Ok(text) = self.translate_chunked(&primary, smallest).await {
                    if let Some(accepted) = settle(&primary, &text) {
                        return Ok(Self::accept(draft, accepted, LadderStep::ChunkedRetranslation(smallest)));
                    }
                }
            }
        }

        let report = check_consistency(&primary, &fallback);
        if !report.passed() {
            metrics::counter!("content_gate_bilingual_failures_total").increment(1);
            return Err(GateError::Consistency { issues: report.issues });
        }
        if draft.title_en.trim().is_empty() || han_count(&draft.title_en) > 0 {
            draft.title_en = glossary_heading(&draft.title).unwrap_or_else(|| FALLBACK_TITLE.to_string());
        }
        tracing::warn!("双语版本改用结构兜底（合成内容）");
        Ok(Self::accept(draft, fallback, LadderStep::StructuralFallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderFailure};
    use crate::provider::{CompletionProvider, CompletionRequest, ProviderSelection, RetryPolicy};
    use crate::analysis::text::{parse_heading, visible_len};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Reply = Box<dyn Fn(&CompletionRequest) -> Result<String, ProviderError> + Send + Sync>;

    struct FnProvider {
        reply: Reply,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl CompletionProvider for FnProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            (self.reply)(request)
        }
    }

    fn router_with(reply: Reply) -> (ModelRouter, Arc<FnProvider>) {
        let provider = Arc::new(FnProvider {
            reply,
            calls: Mutex::new(0),
        });
        let policy = RetryPolicy {
            retries_per_model: 0,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            request_timeout: Duration::from_secs(5),
            overall_budget: Duration::from_secs(60),
        };
        let selection = ProviderSelection::new("translator", Vec::new(), Duration::from_secs(60));
        (ModelRouter::new(provider.clone(), Arc::new(selection), policy), provider)
    }

    /// 逐行「翻译」：标题换成英文标题，正文换成长度相当的英文句子
    fn fake_translate(text: &str) -> String {
        text.lines()
            .map(|line| {
                if parse_heading(line).is_some() {
                    "## Translated Section".to_string()
                } else if line.trim().is_empty() {
                    String::new()
                } else {
                    let repeat = visible_len(line) / 15 + 1;
                    vec!["Translated text."; repeat].join(" ")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draft(body: &str, body_en: &str) -> ContentDraft {
        ContentDraft {
            title: "品牌經營".to_string(),
            body: body.to_string(),
            body_en: body_en.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_consistent_pair_needs_no_calls() {
        let (router, provider) = router_with(Box::new(|_: &CompletionRequest| Ok("unused".to_string())));
        let mut d = draft("## 一\n第一段內容。", "## One\nThe first paragraph.");
        let step = BilingualLadder::new(&router, &[900]).synchronize(&mut d).await.unwrap();
        assert_eq!(step, LadderStep::Accepted);
        assert_eq!(*provider.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_structured_retranslation_replaces_secondary() {
        let (router, _) = router_with(Box::new(|_: &CompletionRequest| {
            Ok("```json\n{\"title_en\": \"Branding\", \"body_en\": \"## One\\nThe first paragraph.\"}\n```".to_string())
        }));
        let mut d = draft("## 一\n第一段內容。", "");
        let step = BilingualLadder::new(&router, &[900]).synchronize(&mut d).await.unwrap();
        assert_eq!(step, LadderStep::Retranslation);
        assert_eq!(d.title_en, "Branding");
        assert_eq!(d.body_en, "## One\nThe first paragraph.");
        assert_eq!(d.metadata[SYNTHETIC_META_KEY], serde_json::Value::Bool(false));
    }

    #[tokio::test]
    async fn test_heading_patch_without_provider_output() {
        let (router, _) = router_with(Box::new(|_: &CompletionRequest| Err(ProviderError::new(ProviderFailure::Transport, "down"))));
        let primary = "## 背景\n第一段。\n\n## 做法\n第二段。\n\n## 成果\n第三段。\n\n## 結論\n第四段。";
        let secondary = "## Background\nThe company had stalled for a while.\n\n## Approach\nWe rebuilt the funnel from scratch.\n\nResults improved within a quarter.";
        let mut d = draft(primary, secondary);
        let step = BilingualLadder::new(&router, &[900]).synchronize(&mut d).await.unwrap();
        assert_eq!(step, LadderStep::HeadingPatch);
        assert_eq!(d.body_en.matches("## ").count(), 3);
    }

    #[tokio::test]
    async fn test_truncated_output_rescued_by_chunks() {
        let (router, _) = router_with(Box::new(|request: &CompletionRequest| {
            if request.system.contains("JSON") {
                return Ok("not a json reply".to_string());
            }
            let translated = fake_translate(&request.user);
            if request.user.matches("## ").count() >= 3 {
                // 整篇翻译被截断
                let half: Vec<&str> = translated.lines().take(3).collect();
                return Ok(format!("{} and", half.join("\n")));
            }
            Ok(translated)
        }));
        let paragraph = "內容說明。".repeat(60);
        let primary = format!(
            "## 背景\n{p}\n\n## 做法\n{p}\n\n## 成果\n{p}\n\n## 結論\n{p}",
            p = paragraph
        );
        let mut d = draft(&primary, "");
        let step = BilingualLadder::new(&router, &[900, 380]).synchronize(&mut d).await.unwrap();
        assert_eq!(step, LadderStep::ChunkedRetranslation(900));
        assert_eq!(d.body_en.matches("## ").count(), 4);
    }

    #[tokio::test]
    async fn test_fatal_rejection_goes_straight_to_fallback() {
        let (router, provider) = router_with(Box::new(|_: &CompletionRequest| Err(ProviderError::from_status(401, "invalid key"))));
        let primary = "導語說明本文重點。\n\n## 背景\n公司在過去面臨成長停滯。\n\n## 結論\n持續調整才能看見成效。";
        let mut d = draft(primary, "");
        let step = BilingualLadder::new(&router, &[900, 650]).synchronize(&mut d).await.unwrap();
        assert_eq!(step, LadderStep::StructuralFallback);
        assert_eq!(*provider.calls.lock().unwrap(), 1);
        assert_eq!(d.metadata[SYNTHETIC_META_KEY], serde_json::Value::Bool(true));
        assert!(d.body_en.contains("## Background"));
        assert_eq!(d.title_en, "Overview");
    }

    #[test]
    fn test_chunks_respect_paragraph_boundaries() {
        let body = "甲甲甲\n\n乙乙乙\n\n丙丙丙";
        assert_eq!(split_chunks(body, 6), vec!["甲甲甲\n\n乙乙乙", "丙丙丙"]);
        assert_eq!(split_chunks(body, 2).len(), 3);
    }
}
