// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::cache::CacheStore;
use crate::config::Settings;
use crate::ingest::providers::{
    covid::CovidProvider, http_client, news::NewsProvider, weather::WeatherProvider,
};
use crate::ingest::types::Fetcher;
use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fetch_runs_total", "Fetcher invocations per source.");
        describe_counter!("fetch_errors_total", "Fetcher errors per source.");
        describe_histogram!("fetch_ms", "Fetch round-trip time in milliseconds.");
        describe_counter!(
            "notifications_rebuilt_total",
            "Successful notification rebuilds."
        );
        describe_counter!("alarms_scheduled_total", "Alarms accepted.");
        describe_counter!("alarms_delivered_total", "Alarms handed to speech.");
        describe_counter!("alarms_dropped_total", "Due alarms the speech worker refused.");
        describe_counter!("covid_alerts_total", "Case-increase alerts spoken.");
        describe_gauge!(
            "refresh_last_run_ts",
            "Unix ts when the refresh cycle last ran."
        );
    });
}

/// The three live sources, sharing one client.
pub fn default_fetchers(settings: &Settings) -> Result<Vec<Box<dyn Fetcher>>> {
    let client = http_client(settings.http_timeout())?;
    Ok(vec![
        Box::new(WeatherProvider::from_settings(settings, client.clone())),
        Box::new(NewsProvider::from_settings(settings, client.clone())),
        Box::new(CovidProvider::from_settings(settings, client)),
    ])
}

/// Fetch one source and overwrite its cache file.
/// The network call runs outside the cache lock.
pub async fn refresh_source(fetcher: &dyn Fetcher, cache: &CacheStore) -> Result<()> {
    counter!("fetch_runs_total", "source" => fetcher.name()).increment(1);
    let body = fetcher.fetch().await?;
    cache.write_json(fetcher.doc(), &body).await?;
    tracing::debug!(source = fetcher.name(), "cache refreshed");
    Ok(())
}

/// Refresh every source once. Failures are logged and leave the stale file
/// in place; returns how many sources were refreshed.
pub async fn refresh_all(fetchers: &[Box<dyn Fetcher>], cache: &CacheStore) -> usize {
    ensure_metrics_described();

    let mut ok = 0usize;
    for f in fetchers {
        match refresh_source(f.as_ref(), cache).await {
            Ok(()) => ok += 1,
            Err(e) => {
                tracing::warn!(error = ?e, source = f.name(), "fetch failed, keeping stale cache");
                counter!("fetch_errors_total", "source" => f.name()).increment(1);
            }
        }
    }

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("refresh_last_run_ts").set(now as f64);
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDoc;

    #[tokio::test]
    async fn failed_fetch_keeps_previous_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(tmp.path());
        let good = r#"{"articles":[{"title":"A","url":"u","description":"d"}]}"#;

        let fetchers: Vec<Box<dyn Fetcher>> = vec![Box::new(NewsProvider::from_fixture(good))];
        assert_eq!(refresh_all(&fetchers, &cache).await, 1);

        let broken: Vec<Box<dyn Fetcher>> =
            vec![Box::new(NewsProvider::from_fixture(r#"{"status":"error"}"#))];
        assert_eq!(refresh_all(&broken, &cache).await, 0);

        let v: serde_json::Value = cache.read_json(CacheDoc::News).await.unwrap();
        assert_eq!(v["articles"][0]["title"], "A");
    }
}
