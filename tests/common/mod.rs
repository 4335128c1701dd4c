// 集成测试公共模块
//
// 提供脚本化的补全服务、草稿样本与请求构建器

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use content_gate::provider::{CompletionProvider, CompletionRequest};
use content_gate::{
    ArticleType, ContentDraft, ContentStore, ContentVariant, GateConfig, GenerationRequest, MemoryStore,
    Orchestrator, Platform, ProviderError, ProviderFailure,
};

pub const CTA_URL: &str = "https://example.com/services/content";
pub const KEYWORD: &str = "內容行銷";

/// 按顺序返回预设回复的补全服务；回复用完后重复最后一条
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    last: Mutex<Option<Result<String, ProviderError>>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn always(reply: Result<String, ProviderError>) -> Arc<Self> {
        Self::new(vec![reply])
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => {
                *self.last.lock().unwrap() = Some(reply.clone());
                reply
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(ProviderError::new(ProviderFailure::Transport, "没有预设回复"))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub const GOOD_BODY: &str = "簡單來說，內容行銷是指用有價值的資訊吸引並留住顧客，而不是直接推銷產品。

## 內容行銷的核心概念
內容行銷是一種長期經營的策略，重點在於持續提供讀者真正需要的知識，讓品牌在對方心中建立專業形象。

## 市場現況與數據
根據經濟部2025年調查，導入內容策略的中小企業中，有 38% 表示詢問量明顯增加。穩定產出的團隊通常在半年內看到搜尋流量成長。

## 執行重點清單
- 先釐清目標讀者與他們最常遇到的問題
- 規劃每月固定的主題與發布節奏
- 每季檢視成效並調整題材方向
想了解完整的規劃方式，歡迎參考 https://example.com/services/content 的說明。

## 常見問題
Q: 內容行銷多久會看到成效？
A: 一般需要三到六個月的穩定經營。
Q: 小團隊也能做內容行銷嗎？
A: 可以，從每月兩篇文章開始即可。
Q: 需要準備多少預算？
A: 依規模而定，初期以人力時間為主。";

pub const GOOD_BODY_EN: &str = "In short, content marketing means attracting and keeping customers with useful information instead of pushing products directly.

## Core Ideas of Content Marketing
Content marketing is a long-term strategy focused on consistently giving readers the knowledge they need, so the brand earns a professional reputation.

## Market Data
According to a 2025 survey by the Ministry of Economic Affairs, 38% of small businesses with a content strategy reported more inquiries. Teams that publish steadily usually see search traffic grow within six months.

## Action Checklist
- Clarify the target readers and the problems they face most often
- Plan a fixed monthly topic and publishing rhythm
- Review results every quarter and adjust topics
For the full planning approach, see the guide at https://example.com/services/content for details.

## FAQ
Q: How long does content marketing take to show results?
A: Usually three to six months of steady work.
Q: Can a small team do content marketing?
A: Yes, starting with two articles a month is enough.
Q: How much budget is needed?
A: It depends on scale, and early costs are mostly staff time.";

/// 通过全部闸门的完整回复
pub fn good_completion() -> String {
    serde_json::json!({
        "title": "內容行銷入門指南",
        "body": GOOD_BODY,
        "title_en": "A Starter Guide to Content Marketing",
        "body_en": GOOD_BODY_EN,
        "hashtags": ["#內容行銷"],
        "image_prompt": "A small team planning content topics on a whiteboard",
        "seo_title": "內容行銷入門指南",
    })
    .to_string()
}

/// 多处硬性问题：短网址、缺少 FAQ、过时年份
pub fn flawed_completion() -> String {
    let body = "簡單來說，內容行銷是指用有價值的資訊吸引顧客。\n\n\
## 內容行銷的核心概念\n2023年很多品牌開始重視內容經營，重點在於持續提供讀者真正需要的知識與觀點。\n\n\
## 執行方式\n- 規劃每月固定的主題與發布節奏與檢視方式\n- 每季檢視成效並調整題材方向與團隊分工\n\n\
更多資訊 https://bit.ly/abc";
    serde_json::json!({
        "title": "內容行銷入門指南",
        "body": body,
        "seo_title": "內容行銷入門指南",
    })
    .to_string()
}

pub const SHORTENED_URL: &str = "https://bit.ly/promo";

/// 只靠确定性修复就能通过的回复：缺少 FAQ，CTA 后面多一行孤立短网址
pub fn repairable_completion() -> String {
    let faq_start = GOOD_BODY.find("\n\n## 常見問題").unwrap();
    let body = GOOD_BODY[..faq_start].replacen(
        "的說明。",
        &format!("的說明。\n{}", SHORTENED_URL),
        1,
    );
    serde_json::json!({
        "title": "內容行銷入門指南",
        "body": body,
        "title_en": "A Starter Guide to Content Marketing",
        "body_en": GOOD_BODY_EN,
        "hashtags": ["#內容行銷"],
        "image_prompt": "A small team planning content topics on a whiteboard",
        "seo_title": "內容行銷入門指南",
    })
    .to_string()
}

/// 修订无法挽救的回复：主语言为简体字
pub fn simplified_completion() -> String {
    serde_json::json!({
        "title": "这是关于软件的文章",
        "body": "这是一篇关于软件与网络的文章，说明为什么数据质量很重要。",
    })
    .to_string()
}

pub fn test_config() -> GateConfig {
    GateConfig {
        reference_year: Some(2026),
        retries_per_model: 1,
        retry_delay_ms: 10,
        fallback_models: vec!["backup-model".to_string()],
        extractability_boost: false,
        ..GateConfig::default()
    }
}

pub fn request(platform: Platform) -> GenerationRequest {
    GenerationRequest {
        topic: "內容行銷".to_string(),
        keyword: KEYWORD.to_string(),
        platform,
        variant: ContentVariant::Default,
        article_type: ArticleType::General,
        cta_url: CTA_URL.to_string(),
        secondary_allow_list: Vec::new(),
        date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        improvement_actions: Vec::new(),
    }
}

pub fn orchestrator(provider: Arc<ScriptedProvider>, store: Arc<MemoryStore>) -> Orchestrator {
    orchestrator_with(test_config(), provider, store)
}

pub fn orchestrator_with(config: GateConfig, provider: Arc<ScriptedProvider>, store: Arc<MemoryStore>) -> Orchestrator {
    let store: Arc<dyn ContentStore> = store;
    Orchestrator::new(config, provider, store)
}

/// 导语没有「先给答案」的版本：GEO 仍达标，可提取性不足
pub fn weak_lead_completion() -> String {
    let body = GOOD_BODY.replacen(
        "簡單來說，內容行銷是指用有價值的資訊吸引並留住顧客，而不是直接推銷產品。",
        "很多品牌都在談內容行銷，它靠有價值的資訊吸引並留住顧客，而不只是推銷產品。",
        1,
    );
    serde_json::json!({
        "title": "內容行銷入門指南",
        "body": body,
        "title_en": "A Starter Guide to Content Marketing",
        "body_en": GOOD_BODY_EN,
        "hashtags": ["#內容行銷"],
        "image_prompt": "A small team planning content topics on a whiteboard",
        "seo_title": "內容行銷入門指南",
    })
    .to_string()
}

pub fn draft(body: &str) -> ContentDraft {
    ContentDraft {
        title: "內容行銷入門指南".to_string(),
        body: body.to_string(),
        cta_url: CTA_URL.to_string(),
        ..Default::default()
    }
}
