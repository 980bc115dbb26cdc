//! File-backed cache of the last fetched documents.
//!
//! Every document is overwritten wholesale (temp file + rename). All access goes
//! through one async mutex so the refresh jobs and the web handlers never
//! interleave a read-modify-write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheDoc {
    Weather,
    News,
    Covid,
    Notifications,
    CaseSnapshot,
}

impl CacheDoc {
    pub fn file_name(self) -> &'static str {
        match self {
            CacheDoc::Weather => "weather.json",
            CacheDoc::News => "news.json",
            CacheDoc::Covid => "covid.json",
            CacheDoc::Notifications => "notifications.json",
            CacheDoc::CaseSnapshot => "local_covid_store.txt",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

/// Exclusive access to the cache directory for the lifetime of the guard.
pub struct CacheGuard<'a> {
    dir: &'a Path,
    _guard: MutexGuard<'a, ()>,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, doc: CacheDoc) -> PathBuf {
        self.dir.join(doc.file_name())
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating cache dir {}", self.dir.display()))
    }

    pub async fn lock(&self) -> CacheGuard<'_> {
        CacheGuard {
            dir: &self.dir,
            _guard: self.lock.lock().await,
        }
    }

    pub async fn read_json<T: DeserializeOwned>(&self, doc: CacheDoc) -> Result<T> {
        self.lock().await.read_json(doc).await
    }

    pub async fn write_json<T: Serialize + ?Sized>(&self, doc: CacheDoc, value: &T) -> Result<()> {
        self.lock().await.write_json(doc, value).await
    }
}

impl CacheGuard<'_> {
    fn path_of(&self, doc: CacheDoc) -> PathBuf {
        self.dir.join(doc.file_name())
    }

    pub async fn exists(&self, doc: CacheDoc) -> bool {
        fs::try_exists(self.path_of(doc)).await.unwrap_or(false)
    }

    pub async fn read_text(&self, doc: CacheDoc) -> Result<String> {
        let path = self.path_of(doc);
        fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))
    }

    pub async fn read_json<T: DeserializeOwned>(&self, doc: CacheDoc) -> Result<T> {
        let raw = self.read_text(doc).await?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", doc.file_name()))
    }

    pub async fn write_text(&self, doc: CacheDoc, content: &str) -> Result<()> {
        let path = self.path_of(doc);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("replacing {}", path.display()))
    }

    pub async fn write_json<T: Serialize + ?Sized>(&self, doc: CacheDoc, value: &T) -> Result<()> {
        let body = serde_json::to_string_pretty(value)
            .with_context(|| format!("serializing {}", doc.file_name()))?;
        self.write_text(doc, &body).await
    }
}
