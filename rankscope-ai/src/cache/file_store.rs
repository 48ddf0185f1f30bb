//! Local durable cache store: one JSON file per key

use super::{CacheBackendKind, CacheError, CacheStore};
use async_trait::async_trait;
use rankscope_common::hash::content_hash;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Cache records stored as `{sha256(key)}.json` under a directory
///
/// Writes go to a unique temporary file that is renamed into place, so
/// concurrent writers to one key resolve to whichever rename lands last.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", content_hash(key)))
    }
}

#[async_trait]
impl CacheStore for FileStore {
    fn kind(&self) -> CacheBackendKind {
        CacheBackendKind::File
    }

    async fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        match tokio::fs::read_to_string(self.record_path(key)).await {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, payload: &str, _ttl: Duration) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.record_path(key);
        let staging = self.dir.join(format!(".{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&staging, payload).await?;
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        match tokio::fs::remove_file(self.record_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_all(&self) -> Result<(), CacheError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }
}
