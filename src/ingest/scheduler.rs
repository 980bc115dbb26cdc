// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::announce::SpeechHandle;
use crate::cache::CacheStore;
use crate::change_detector::{self, CaseAlert};
use crate::config::Settings;
use crate::history::History;
use crate::ingest::{refresh_all, types::Fetcher};
use crate::notify;

#[derive(Clone, Copy, Debug)]
pub struct RefreshCfg {
    pub refresh_interval: Duration,
    pub snapshot_interval: Duration,
}

impl RefreshCfg {
    pub fn from_settings(s: &Settings) -> Self {
        Self {
            refresh_interval: Duration::from_secs(s.refresh_interval_secs),
            snapshot_interval: Duration::from_secs(s.snapshot_interval_secs),
        }
    }
}

/// The background jobs: fetch + rebuild + case check hourly, snapshot every
/// 12 hours. Failures are logged; the next tick is the retry.
pub struct RefreshJobs {
    pub fetchers: Vec<Box<dyn Fetcher>>,
    pub cache: CacheStore,
    pub speech: SpeechHandle,
    pub history: Arc<History>,
    pub alert: Mutex<CaseAlert>,
}

impl RefreshJobs {
    pub fn new(
        fetchers: Vec<Box<dyn Fetcher>>,
        cache: CacheStore,
        speech: SpeechHandle,
        history: Arc<History>,
        alert: CaseAlert,
    ) -> Self {
        Self {
            fetchers,
            cache,
            speech,
            history,
            alert: Mutex::new(alert),
        }
    }

    /// One refresh cycle: fetch all sources, rebuild notifications, check
    /// the case change.
    pub async fn refresh_tick(&self) {
        let ok = refresh_all(&self.fetchers, &self.cache).await;
        tracing::info!(refreshed = ok, total = self.fetchers.len(), "refresh tick");

        if let Err(e) = notify::rebuild(&self.cache).await {
            tracing::warn!(error = ?e, "notification rebuild failed, keeping previous set");
        }
        self.case_check().await;
    }

    pub async fn case_check(&self) {
        let mut alert = self.alert.lock().await;
        let res = alert
            .run_check(&self.cache, &self.speech, &self.history, chrono::Utc::now())
            .await;
        if let Err(e) = res {
            tracing::warn!(error = ?e, "case change check skipped");
        }
    }

    pub async fn snapshot_tick(&self) {
        if let Err(e) = change_detector::store_snapshot(&self.cache).await {
            tracing::warn!(error = ?e, "case snapshot failed");
        }
    }

    /// Startup: refresh once, seed the snapshot if there is none, check.
    pub async fn startup(&self) {
        refresh_all(&self.fetchers, &self.cache).await;
        if let Err(e) = notify::rebuild(&self.cache).await {
            tracing::warn!(error = ?e, "initial notification rebuild failed");
        }
        if let Err(e) = change_detector::ensure_snapshot(&self.cache).await {
            tracing::warn!(error = ?e, "initial case snapshot failed");
        }
        self.case_check().await;
    }

    /// Spawn both periodic loops. The first tick of each comes one period
    /// after start; call `startup` for the immediate run.
    pub fn spawn(self: Arc<Self>, cfg: RefreshCfg) -> Vec<JoinHandle<()>> {
        let hourly = {
            let jobs = self.clone();
            tokio::spawn(async move {
                let start = tokio::time::Instant::now() + cfg.refresh_interval;
                let mut ticker = tokio::time::interval_at(start, cfg.refresh_interval);
                loop {
                    ticker.tick().await;
                    jobs.refresh_tick().await;
                }
            })
        };
        let snapshot = {
            let jobs = self;
            tokio::spawn(async move {
                let start = tokio::time::Instant::now() + cfg.snapshot_interval;
                let mut ticker = tokio::time::interval_at(start, cfg.snapshot_interval);
                loop {
                    ticker.tick().await;
                    jobs.snapshot_tick().await;
                }
            })
        };
        vec![hourly, snapshot]
    }
}
