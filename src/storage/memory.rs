//! 内存存储

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{already_exists, ContentStore, StoreKey};
use crate::error::GateResult;
use crate::model::ContentDraft;

/// 进程内存储（测试与单次运行）
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<StoreKey, ContentDraft>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn read(&self, key: &StoreKey) -> GateResult<Option<ContentDraft>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn write(&self, key: &StoreKey, draft: &ContentDraft) -> GateResult<()> {
        match self.entries.entry(*key) {
            Entry::Occupied(_) => Err(already_exists(key)),
            Entry::Vacant(slot) => {
                slot.insert(draft.clone());
                tracing::debug!("内存存储写入: {}", key);
                Ok(())
            }
        }
    }
}
