//! JSON 文件存储
//!
//! 布局：`<root>/<date>/<platform>[.<variant>].json`。先写入同目录的临时文件，
//! 再以不覆盖的方式落盘，因此读者只会看到完整的文件，且同一个键只能写一次。

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use super::{already_exists, ContentStore, StoreKey};
use crate::error::{GateError, GateResult};
use crate::model::ContentDraft;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 根目录支持 `~` 展开
    pub fn from_config(config: &crate::config::GateConfig) -> Self {
        Self::new(shellexpand::tilde(&config.output_dir).as_ref())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &StoreKey) -> PathBuf {
        self.root.join(key.date.to_string()).join(key.file_name())
    }
}

fn read_blocking(path: &Path) -> GateResult<Option<ContentDraft>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.into()),
    }
}

fn write_blocking(path: &Path, key: &StoreKey, draft: &ContentDraft) -> GateResult<()> {
    if path.exists() {
        return Err(already_exists(key));
    }
    let dir = path
        .parent()
        .ok_or_else(|| GateError::Storage(format!("无效的存储路径: {}", path.display())))?;
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    let json = serde_json::to_string_pretty(draft)?;
    temp.write_all(json.as_bytes())?;
    temp.as_file().sync_all()?;

    temp.persist_noclobber(path).map_err(|error| {
        if error.error.kind() == ErrorKind::AlreadyExists {
            already_exists(key)
        } else {
            GateError::Storage(format!("落盘失败 {}: {}", path.display(), error.error))
        }
    })?;
    Ok(())
}

#[async_trait]
impl ContentStore for FileStore {
    async fn read(&self, key: &StoreKey) -> GateResult<Option<ContentDraft>> {
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || read_blocking(&path))
            .await
            .map_err(|e| GateError::Internal(format!("读取任务失败: {}", e)))?
    }

    async fn write(&self, key: &StoreKey, draft: &ContentDraft) -> GateResult<()> {
        let path = self.path_for(key);
        let key = *key;
        let draft = draft.clone();
        tokio::task::spawn_blocking(move || write_blocking(&path, &key, &draft))
            .await
            .map_err(|e| GateError::Internal(format!("写入任务失败: {}", e)))??;
        tracing::info!("已写入 {}", self.path_for(&key).display());
        Ok(())
    }
}
