//! Case-increase alert.
//!
//! Every 12 hours the newest "new cases" figure is stored in
//! `local_covid_store.txt`; the hourly check compares the live figure against
//! it, so the comparison window is at most one snapshot interval.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::counter;

use crate::antiflutter::AntiFlutter;
use crate::announce::SpeechHandle;
use crate::cache::{CacheDoc, CacheGuard, CacheStore};
use crate::history::History;
use crate::ingest::types::CovidDoc;

/// True when cases rose by at least `threshold` (a fraction) relative to the
/// previous sample. Zero or negative counts never alert; a rise from a zero
/// sample has no relative size, so it stays silent too.
pub fn check(today_count: i64, previous_count: i64, threshold: f64) -> bool {
    if today_count <= 0 || previous_count <= 0 || !threshold.is_finite() {
        return false;
    }
    let increase = (today_count - previous_count) as f64 / previous_count as f64;
    increase >= threshold
}

pub fn alert_text(threshold: f64) -> String {
    format!(
        "COVID Alert, Cases have increased by {:.0} percent or more since the last update.",
        threshold * 100.0
    )
}

async fn live_count(guard: &CacheGuard<'_>) -> Result<Option<i64>> {
    let doc: CovidDoc = guard.read_json(CacheDoc::Covid).await?;
    let today = doc.data.first().context("covid data has no rows")?;
    Ok(today.new_cases_by_publish_date)
}

/// Overwrite the snapshot with the newest "new cases" figure.
/// Returns the stored value; a null figure leaves the old snapshot alone.
pub async fn store_snapshot(cache: &CacheStore) -> Result<Option<i64>> {
    let guard = cache.lock().await;
    let count = live_count(&guard).await?;
    match count {
        Some(n) => {
            guard.write_text(CacheDoc::CaseSnapshot, &n.to_string()).await?;
            tracing::info!(cases = n, "case snapshot stored");
        }
        None => tracing::warn!("newest case figure is null, snapshot not updated"),
    }
    Ok(count)
}

/// Store a snapshot only if none exists yet (first start).
pub async fn ensure_snapshot(cache: &CacheStore) -> Result<()> {
    let exists = cache.lock().await.exists(CacheDoc::CaseSnapshot).await;
    if !exists {
        store_snapshot(cache).await?;
    }
    Ok(())
}

pub async fn read_snapshot(cache: &CacheStore) -> Result<i64> {
    let raw = cache.lock().await.read_text(CacheDoc::CaseSnapshot).await?;
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("snapshot is not a number: {:?}", raw.trim()))
}

/// Everything the hourly check needs besides the cache.
pub struct CaseAlert {
    pub threshold: f64,
    pub gate: AntiFlutter,
}

impl CaseAlert {
    pub fn new(threshold: f64, cooldown_secs: i64) -> Self {
        Self {
            threshold,
            gate: AntiFlutter::new(cooldown_secs),
        }
    }

    /// Compare live cases with the snapshot and queue a spoken alert on a hit.
    /// Returns whether an alert was queued.
    pub async fn run_check(
        &mut self,
        cache: &CacheStore,
        speech: &SpeechHandle,
        history: &History,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let today = {
            let guard = cache.lock().await;
            live_count(&guard).await?
        };
        let Some(today) = today else {
            tracing::debug!("newest case figure is null, no comparison");
            return Ok(false);
        };
        let previous = read_snapshot(cache).await?;

        if !check(today, previous, self.threshold) {
            tracing::debug!(today, previous, "case change below threshold");
            return Ok(false);
        }
        if !self.gate.should_alert(now) {
            tracing::debug!(today, previous, "case alert suppressed by cooldown");
            return Ok(false);
        }

        let text = alert_text(self.threshold);
        tracing::info!(today, previous, threshold = self.threshold, "case increase above threshold");
        speech.enqueue(text.as_str())?;
        history.push("covid-alert", "COVID Alert", &text);
        self.gate.record_alert(now);
        counter!("covid_alerts_total").increment(1);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_examples() {
        assert!(check(130, 100, 0.30));
        assert!(!check(120, 100, 0.30));
        assert!(!check(0, 0, 0.30));
    }

    #[test]
    fn zero_and_negative_counts_fail_closed() {
        assert!(!check(0, 100, 0.0));
        assert!(!check(100, 0, 0.30));
        assert!(!check(-5, 100, 0.30));
        assert!(!check(100, 50, f64::NAN));
    }

    #[test]
    fn decrease_never_alerts_with_positive_threshold() {
        assert!(!check(50, 100, 0.01));
        assert!(check(100, 100, 0.0));
    }

    #[test]
    fn alert_text_uses_percent() {
        assert_eq!(
            alert_text(0.3),
            "COVID Alert, Cases have increased by 30 percent or more since the last update."
        );
    }
}
