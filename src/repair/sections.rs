//! 空章节与单薄章节补写

use super::{stable_index, RepairContext};
use crate::analysis::text::{join_sections, split_sections};
use crate::validators::depth::{checked_sections, is_thin};

/// 补写用的句子模板，`{t}` 为主题，`{h}` 为章节标题
const FILLERS: &[&str] = &[
    "談到{h}，可以先從{t}的核心目標出發，整理出最需要優先處理的事項，再逐一確認執行細節。",
    "在{h}這個環節，建議把{t}拆成幾個可以衡量的小步驟，每完成一步就檢視結果並調整做法。",
    "{h}的關鍵在於掌握{t}與讀者需求之間的關係，先理解對方真正關心的問題，再提供具體可行的建議。",
    "處理{h}時，可以先盤點手邊既有的資源與限制，讓{t}的規劃更貼近實際情況，也更容易持續下去。",
    "對多數團隊而言，{h}往往是{t}中最容易被忽略的部分，提早安排檢查點能有效降低後續修正的成本。",
    "若想把{h}做得更扎實，可以參考過往的成功與失敗案例，歸納出適合自己的{t}執行原則。",
];

fn filler(ctx: &RepairContext, heading: &str, offset: usize) -> String {
    let topic = if ctx.topic.trim().is_empty() {
        ctx.keyword.trim()
    } else {
        ctx.topic.trim()
    };
    let index = (stable_index(&[topic, heading], FILLERS.len()) + offset) % FILLERS.len();
    FILLERS[index].replace("{t}", topic).replace("{h}", heading)
}

/// 为空章节和单薄章节补写内容
///
/// 模板由（主题，标题）的稳定哈希选出，相同输入总是得到相同补写。
pub fn enrich_thin_sections(body: &str, ctx: &RepairContext) -> String {
    let mut sections = split_sections(body);
    let thin: Vec<(usize, String)> = checked_sections(&sections)
        .into_iter()
        .filter(|(_, section)| is_thin(section))
        .filter_map(|(index, section)| Some((index, section.heading_text()?.to_string())))
        .collect();

    if thin.is_empty() {
        return body.to_string();
    }

    for (index, heading) in &thin {
        let section = &mut sections[*index];
        let insert_at = section
            .lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map(|last| last + 1)
            .unwrap_or(0);

        let mut offset = 0;
        let mut added = 0;
        while is_thin(section) && offset < FILLERS.len() {
            section
                .lines
                .insert(insert_at + added, filler(ctx, heading, offset));
            added += 1;
            offset += 1;
        }
        // 与下一个标题之间保留空行
        if section.lines.get(insert_at + added).map(|l| !l.trim().is_empty()).unwrap_or(true) {
            section.lines.insert(insert_at + added, String::new());
        }
    }

    tracing::debug!("补写了 {} 个单薄章节", thin.len());
    join_sections(&sections).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArticleType, ContentDraft, ContentVariant, LinkPolicyContext, Platform};
    use crate::validators::depth::StructuralDepth;
    use crate::validators::{ValidationContext, Validator};

    fn ctx() -> RepairContext {
        RepairContext::new(
            "品牌經營",
            "品牌",
            LinkPolicyContext::new(Platform::Blog, ContentVariant::Default),
            2026,
        )
    }

    #[test]
    fn test_empty_and_thin_sections_are_filled() {
        let body = "導語。\n\n## 定位\n\n## 溝通\n簡短。\n\n## 常見問題\nQ: 一？\nA: 是。";
        let enriched = enrich_thin_sections(body, &ctx());
        let draft = ContentDraft {
            body: enriched.clone(),
            ..Default::default()
        };
        let vctx = ValidationContext::new(
            LinkPolicyContext::new(Platform::Blog, ContentVariant::Default),
            ArticleType::General,
            2026,
        );
        assert!(StructuralDepth.validate(&draft, &vctx).is_empty());
        assert!(enriched.contains("簡短。\n"));
        assert!(enriched.ends_with("Q: 一？\nA: 是。"));
    }

    #[test]
    fn test_filler_choice_is_stable() {
        let body = "## 定位\n";
        assert_eq!(enrich_thin_sections(body, &ctx()), enrich_thin_sections(body, &ctx()));
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        let body = "## 定位\n\n## 溝通\n簡短。";
        let once = enrich_thin_sections(body, &ctx());
        assert_eq!(enrich_thin_sections(&once, &ctx()), once);
    }

    #[test]
    fn test_container_heading_is_left_alone() {
        let body = "## 策略\n### 第一步\n這一步需要投入足夠的時間，先完整盤點品牌現有的資產與受眾輪廓，再與團隊討論後才能定出清楚的方向。";
        assert_eq!(enrich_thin_sections(body, &ctx()), body);
    }
}
