//! 配置管理模块
//!
//! 提供质量闸门的全部可调参数：默认值常量、分层加载的 [`GateConfig`]、
//! 以及各发布平台的固定规则表 [`PlatformProfile`]。

pub mod manager;
pub mod platform;

// 重新导出主要类型
pub use manager::{ConfigManager, EvidenceMode, GateConfig, GateMode};
pub use platform::PlatformProfile;

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 相似度与去重
    pub const NEAR_DUPLICATE_JACCARD: f64 = 0.92;
    pub const CONTAINMENT_MIN_CHARS: usize = 50;
    pub const CONTAINMENT_LENGTH_RATIO: f64 = 0.9;
    pub const DEDUP_MIN_CHARS: usize = 8;

    // 结构深度
    pub const MIN_SECTION_CHARS: usize = 40;
    pub const MAX_THIN_SECTION_RATIO: f64 = 1.0 / 3.0;

    // 时效性
    pub const CITATION_WINDOW_LINES: usize = 1;
    pub const NEUTRAL_YEAR_ZH: &str = "近年";
    pub const NEUTRAL_YEAR_EN: &str = "recent years";

    // 评分与修订
    pub const DEFAULT_SCORE_THRESHOLD: u32 = 85;
    pub const DEFAULT_MAX_REVISION_ROUNDS: usize = 2;
    pub const HARD_ISSUE_DISTANCE: f64 = 1000.0;
    pub const SOFT_ISSUE_DISTANCE: f64 = 5.0;
    pub const MAX_SEO_TITLE_CHARS: usize = 60;

    // 文本补全服务
    pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const DEFAULT_PRIMARY_MODEL: &str = "gpt-4o";
    pub const DEFAULT_FALLBACK_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4.1-mini"];
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
    pub const DEFAULT_RETRIES_PER_MODEL: usize = 2;
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
    pub const MAX_RETRY_DELAY_MS: u64 = 5_000;
    pub const DEFAULT_OVERALL_BUDGET: Duration = Duration::from_secs(300);
    pub const DEFAULT_DEGRADED_COOLDOWN: Duration = Duration::from_secs(600);

    // 双语修复：分块重译的块大小阶梯（字符）
    pub const DEFAULT_CHUNK_SIZES: &[usize] = &[900, 650, 520, 380];

    pub const DEFAULT_OUTPUT_DIR: &str = "content";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "content-gate.toml",
        ".content-gate.toml",
        "~/.config/content-gate/config.toml",
        "/etc/content-gate/config.toml",
    ];

    // 短网址服务
    pub const SHORTENER_DOMAINS: &[&str] = &[
        "bit.ly", "tinyurl.com", "t.co", "goo.gl", "reurl.cc", "lihi.cc", "ppt.cc", "is.gd",
        "ow.ly", "buff.ly", "rebrand.ly", "lnkd.in",
    ];

    // 引用语境关键词
    pub const CITATION_KEYWORDS: &[&str] = &[
        "根據", "資料來源", "來源", "統計", "調查", "報告", "研究", "數據", "指出", "顯示",
        "according to", "source", "report", "survey", "study",
    ];

    // 行动呼吁关键词
    pub const CTA_KEYWORDS: &[&str] = &[
        "了解更多", "立即", "點擊", "點此", "前往", "預約", "報名", "諮詢", "歡迎參考", "詳情",
        "learn more", "sign up", "book", "visit", "click",
    ];

    // 营销词
    pub const MARKETING_KEYWORDS: &[&str] = &[
        "限時", "優惠", "立即", "搶購", "折扣", "免費", "獨家", "馬上", "特價", "下殺", "最後機會",
    ];

    // 平台安全用语（所有平台一律禁止）
    pub const SAFETY_PHRASES: &[&str] = &[
        "保證獲利", "穩賺不賠", "無風險", "100%有效", "包過", "躺著賺", "guaranteed profit",
        "risk-free",
    ];
}

/// 检查是否存在任一配置文件
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}
