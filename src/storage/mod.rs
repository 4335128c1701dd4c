//! 写一次的内容存储
//!
//! 以 (日期, 平台, 内容变体) 为键。同一个键只能写入一次，中间草稿从不落盘。
//!
//! - `memory` - 基于 `DashMap` 的内存实现
//! - `file` - JSON 文件实现，通过同目录临时文件原子落盘

pub mod file;
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};
use crate::model::{ContentDraft, ContentVariant, GenerationRequest, Platform};

pub use file::FileStore;
pub use memory::MemoryStore;

/// 存储键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
    pub date: NaiveDate,
    pub platform: Platform,
    pub variant: ContentVariant,
}

impl StoreKey {
    pub fn new(date: NaiveDate, platform: Platform, variant: ContentVariant) -> Self {
        Self {
            date,
            platform,
            variant,
        }
    }

    pub fn for_request(request: &GenerationRequest) -> Self {
        Self::new(request.date, request.platform, request.variant)
    }

    /// 文件名：默认变体为 `<platform>.json`，其余为 `<platform>.<variant>.json`
    pub fn file_name(&self) -> String {
        match self.variant {
            ContentVariant::Default => format!("{}.json", self.platform),
            other => format!("{}.{}.json", self.platform, other),
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.date, self.platform, self.variant)
    }
}

/// 内容存储接口
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// 读取已定稿的草稿
    async fn read(&self, key: &StoreKey) -> GateResult<Option<ContentDraft>>;

    /// 写入定稿；键已存在时返回错误
    async fn write(&self, key: &StoreKey, draft: &ContentDraft) -> GateResult<()>;
}

pub(crate) fn already_exists(key: &StoreKey) -> GateError {
    GateError::Storage(format!("内容已存在，拒绝覆盖: {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_includes_non_default_variant() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let key = StoreKey::new(date, Platform::Blog, ContentVariant::Default);
        assert_eq!(key.file_name(), "blog.json");
        let key = StoreKey::new(date, Platform::Vocus, ContentVariant::Campaign);
        assert_eq!(key.file_name(), "vocus.campaign.json");
        assert_eq!(key.to_string(), "2026-03-01/vocus/campaign");
    }
}
