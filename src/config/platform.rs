//! 发布平台规则表

use crate::model::{ContentVariant, Platform};

/// 单个平台的固定规则
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformProfile {
    pub platform: Platform,
    /// 需要的 FAQ 问答对数量；0 表示不要求
    pub required_faq_pairs: usize,
    /// 正文允许的链接总数
    pub max_links: usize,
    /// 允许的行动呼吁行数
    pub max_cta_lines: usize,
    /// 首段是否允许放置行动呼吁
    pub cta_in_first_paragraph: bool,
    /// 默认变体下是否允许一个次要链接
    pub allows_secondary_link: bool,
    /// 营销词密度上限（每千字命中次数）
    pub max_marketing_per_kchar: f64,
    /// 平台专属禁用词
    pub banned_phrases: &'static [&'static str],
}

const COMMON_BANNED: &[&str] = &["最便宜", "全網最低", "不買後悔"];

impl PlatformProfile {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Blog => Self {
                platform,
                required_faq_pairs: 3,
                max_links: 2,
                max_cta_lines: 2,
                cta_in_first_paragraph: true,
                allows_secondary_link: true,
                max_marketing_per_kchar: 8.0,
                banned_phrases: COMMON_BANNED,
            },
            Platform::Medium => Self {
                platform,
                required_faq_pairs: 2,
                max_links: 2,
                max_cta_lines: 1,
                cta_in_first_paragraph: false,
                allows_secondary_link: true,
                max_marketing_per_kchar: 6.0,
                banned_phrases: COMMON_BANNED,
            },
            Platform::Linkedin => Self {
                platform,
                required_faq_pairs: 2,
                max_links: 1,
                max_cta_lines: 1,
                cta_in_first_paragraph: false,
                allows_secondary_link: false,
                max_marketing_per_kchar: 5.0,
                banned_phrases: &["最便宜", "全網最低", "不買後悔", "私訊我", "加我好友"],
            },
            Platform::Facebook => Self {
                platform,
                required_faq_pairs: 0,
                max_links: 1,
                max_cta_lines: 1,
                cta_in_first_paragraph: true,
                allows_secondary_link: false,
                max_marketing_per_kchar: 8.0,
                banned_phrases: &["最便宜", "全網最低", "不買後悔", "分享到三個社團", "留言+1"],
            },
            Platform::Vocus => Self {
                platform,
                required_faq_pairs: 2,
                max_links: 2,
                max_cta_lines: 1,
                cta_in_first_paragraph: false,
                allows_secondary_link: true,
                max_marketing_per_kchar: 6.0,
                banned_phrases: COMMON_BANNED,
            },
        }
    }

    /// 在给定变体下允许的次要链接数
    pub fn secondary_links_allowed(&self, variant: ContentVariant) -> usize {
        match variant {
            ContentVariant::Campaign => 1,
            ContentVariant::Default if self.allows_secondary_link => 1,
            ContentVariant::Default => 0,
        }
    }

    /// 在给定变体下正文允许的链接总数（主链接 + 允许的次要链接不会被截断）
    pub fn effective_max_links(&self, variant: ContentVariant) -> usize {
        self.max_links.max(1 + self.secondary_links_allowed(variant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_variant_always_allows_secondary_link() {
        let linkedin = PlatformProfile::for_platform(Platform::Linkedin);
        assert_eq!(linkedin.secondary_links_allowed(ContentVariant::Default), 0);
        assert_eq!(linkedin.secondary_links_allowed(ContentVariant::Campaign), 1);
        assert_eq!(linkedin.effective_max_links(ContentVariant::Campaign), 2);
    }

    #[test]
    fn test_every_platform_has_profile() {
        for platform in Platform::ALL {
            let profile = PlatformProfile::for_platform(platform);
            assert_eq!(profile.platform, platform);
            assert!(profile.max_links >= 1);
        }
    }
}
