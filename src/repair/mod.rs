//! 确定性修复变换
//!
//! 不调用补全服务的文本改写，在 AI 修订之后以及作为最终兜底时使用。
//! 每个变换都是幂等的：对已经干净的草稿再次执行不会产生任何变化。
//!
//! 需要「伪随机」挑选模板的地方一律使用语义键的稳定哈希（blake3），
//! 相同输入总是得到相同输出。

pub mod cleanup;
pub mod cta;
pub mod faq;
pub mod freshness;
pub mod links;
pub mod sections;

use crate::config::PlatformProfile;
use crate::model::{ContentDraft, GenerationRequest, LinkPolicyContext};

pub use cleanup::{collapse_duplicate_blocks, strip_artifacts};
pub use cta::inject_cta;
pub use faq::normalize_faq;
pub use freshness::rewrite_stale_years;
pub use links::strip_links;
pub use sections::enrich_thin_sections;

/// 修复所需的上下文
#[derive(Debug, Clone, PartialEq)]
pub struct RepairContext {
    pub topic: String,
    pub keyword: String,
    pub link_policy: LinkPolicyContext,
    pub profile: PlatformProfile,
    pub reference_year: i32,
}

impl RepairContext {
    pub fn new(topic: &str, keyword: &str, link_policy: LinkPolicyContext, reference_year: i32) -> Self {
        let profile = PlatformProfile::for_platform(link_policy.platform);
        Self {
            topic: topic.to_string(),
            keyword: keyword.to_string(),
            link_policy,
            profile,
            reference_year,
        }
    }

    pub fn for_request(request: &GenerationRequest, reference_year: i32) -> Self {
        Self::new(&request.topic, &request.keyword, request.link_context(), reference_year)
    }
}

/// 稳定哈希选择：同样的语义键永远落在同一个下标
pub fn stable_index(parts: &[&str], modulo: usize) -> usize {
    if modulo == 0 {
        return 0;
    }
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(&[0x1f]);
    }
    let hash = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    (u64::from_le_bytes(prefix) % modulo as u64) as usize
}

/// 按固定顺序执行全部修复
pub fn apply_all(draft: &ContentDraft, ctx: &RepairContext) -> ContentDraft {
    let mut repaired = draft.clone();

    strip_artifacts(&mut repaired);
    rewrite_stale_years(&mut repaired, ctx.reference_year);
    repaired.body = collapse_duplicate_blocks(&repaired.body);
    repaired.body = dedup_to_fixpoint(&repaired.body);
    repaired.body = strip_links(&repaired.body, &repaired.cta_url, ctx);
    repaired.body = normalize_faq(&repaired.body, ctx);
    repaired.body = enrich_thin_sections(&repaired.body, ctx);
    repaired.body = inject_cta(&repaired.body, &repaired.cta_url, ctx);

    if repaired != *draft {
        tracing::debug!("确定性修复已改写草稿「{}」", repaired.title);
    }
    repaired
}

const MAX_DEDUP_PASSES: usize = 3;

/// 重复执行去重直到结果不再变化
pub fn dedup_to_fixpoint(body: &str) -> String {
    let mut current = body.to_string();
    for _ in 0..MAX_DEDUP_PASSES {
        let next = crate::analysis::similarity::dedup_body(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentVariant, Platform};

    #[test]
    fn test_stable_index_is_reproducible() {
        let a = stable_index(&["數位轉型", "第一節"], 7);
        let b = stable_index(&["數位轉型", "第一節"], 7);
        assert_eq!(a, b);
        assert!(a < 7);
        assert_eq!(stable_index(&["x"], 0), 0);
    }

    #[test]
    fn test_part_boundaries_matter() {
        // ("ab", "c") 与 ("a", "bc") 是不同的键
        let left = stable_index(&["ab", "c"], 1_000_003);
        let right = stable_index(&["a", "bc"], 1_000_003);
        assert_ne!(left, right);
    }

    #[test]
    fn test_context_for_platform() {
        let ctx = RepairContext::new(
            "主題",
            "關鍵字",
            LinkPolicyContext::new(Platform::Vocus, ContentVariant::Campaign),
            2026,
        );
        assert_eq!(ctx.profile.platform, Platform::Vocus);
    }
}
