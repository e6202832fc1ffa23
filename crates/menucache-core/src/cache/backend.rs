use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};

use crate::error::CacheError;

/// Key/value persistence for the local store.
///
/// `read` returns `Ok(None)` when nothing was ever written under `key`.
pub trait StorageBackend: Send + Sync {
    fn read<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>>;

    fn write<'a>(&'a self, key: &'a str, contents: String)
        -> BoxFuture<'a, Result<(), CacheError>>;
}

/// Stores each key as `<cache_dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    cache_dir: PathBuf,
}

impl FileStorage {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileStorage {
    fn read<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>> {
        async move {
            let path = self.cache_path(key);
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(CacheError::StorageUnavailable(format!(
                    "read {}: {}",
                    path.display(),
                    e
                ))),
            }
        }
        .boxed()
    }

    fn write<'a>(
        &'a self,
        key: &'a str,
        contents: String,
    ) -> BoxFuture<'a, Result<(), CacheError>> {
        async move {
            let path = self.cache_path(key);
            // Write beside the target and rename so a crash never leaves half a file
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, contents).await.map_err(|e| {
                CacheError::StorageUnavailable(format!("write {}: {}", tmp.display(), e))
            })?;
            tokio::fs::rename(&tmp, &path).await.map_err(|e| {
                CacheError::StorageUnavailable(format!("rename to {}: {}", path.display(), e))
            })
        }
        .boxed()
    }
}

/// In-memory backend.
///
/// Writes can be made to fail with `fail_writes`, which is how tests simulate
/// a full or read-only disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<Vec<(String, String)>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `contents` already stored under `key`.
    pub fn with_entry(key: impl Into<String>, contents: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.entries().push((key.into(), contents.into()));
        storage
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw stored contents for `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for MemoryStorage {
    fn read<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>> {
        let contents = self.raw(key);
        async move { Ok(contents) }.boxed()
    }

    fn write<'a>(
        &'a self,
        key: &'a str,
        contents: String,
    ) -> BoxFuture<'a, Result<(), CacheError>> {
        let result = if self.fail_writes.load(Ordering::SeqCst) {
            Err(CacheError::StorageUnavailable("storage is read-only".to_string()))
        } else {
            let mut entries = self.entries();
            match entries.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = contents,
                None => entries.push((key.to_string(), contents)),
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        async move { result }.boxed()
    }
}
