//! Shared alarm queue and its delivery loop.
//!
//! The queue is owned by one `Arc<AlarmQueue>` that the router and the
//! delivery task both hold. The loop sleeps until the earliest alarm (or the
//! idle tick) and is woken early whenever a new alarm is scheduled.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use metrics::counter;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::{AlarmEvent, AlarmHandle, AlarmPayload, AlarmScheduler};
use crate::announce::SpeechHandle;
use crate::briefing;
use crate::cache::CacheStore;
use crate::clock::{self, PastTargetPolicy};
use crate::history::History;

/// Page alarms all share one priority.
pub const DEFAULT_PRIORITY: i32 = 1;

#[derive(Debug, Default)]
pub struct AlarmQueue {
    inner: Mutex<AlarmScheduler>,
    wake: Notify,
}

impl AlarmQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AlarmScheduler> {
        self.inner.lock().expect("alarm queue mutex poisoned")
    }

    pub fn schedule(&self, delay_secs: u64, priority: i32, payload: AlarmPayload) -> AlarmHandle {
        let handle = self.lock().schedule(delay_secs, priority, payload);
        counter!("alarms_scheduled_total").increment(1);
        self.wake.notify_one();
        handle
    }

    /// Schedule for a page time (`... T HH:MM`) relative to `now`.
    /// Returns the handle and the computed delay.
    pub fn schedule_for_time(
        &self,
        target: &str,
        now: DateTime<Local>,
        policy: PastTargetPolicy,
        payload: AlarmPayload,
    ) -> Result<(AlarmHandle, u64)> {
        let target_secs = clock::hhmm_to_seconds(target)?;
        let now_secs = clock::seconds_since_midnight(&now);
        let delay = clock::delay_until(target_secs, now_secs, policy);
        let handle = {
            let mut q = self.lock();
            q.schedule_at(now.with_timezone(&Utc), delay, DEFAULT_PRIORITY, payload)
        };
        counter!("alarms_scheduled_total").increment(1);
        self.wake.notify_one();
        tracing::info!(alarm_id = handle.0, delay_secs = delay, alarm_time = target, "alarm added");
        Ok((handle, delay))
    }

    pub fn cancel(&self, handle: AlarmHandle) -> bool {
        let removed = self.lock().cancel(handle);
        if removed {
            self.wake.notify_one();
        }
        removed
    }

    pub fn pop_due(&self, now: DateTime<Utc>) -> Option<AlarmEvent> {
        self.lock().pop_due(now)
    }

    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        self.lock().next_fire_at()
    }

    pub fn list_pending(&self) -> Vec<AlarmEvent> {
        self.lock().list_pending()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    async fn woken(&self) {
        self.wake.notified().await
    }
}

/// Deliver every alarm due at `now`, earliest first. Returns how many were
/// handed to speech; a due alarm the worker refuses is dropped, not retried.
pub async fn deliver_due(
    queue: &AlarmQueue,
    cache: &CacheStore,
    speech: &SpeechHandle,
    history: &History,
    now: DateTime<Utc>,
) -> usize {
    let mut n = 0usize;
    while let Some(ev) = queue.pop_due(now) {
        let text = briefing::compose(ev.payload.content, &ev.payload.label, cache).await;
        tracing::info!(alarm_id = ev.id.0, label = %ev.payload.label, "alarm firing");
        // A stopped worker never comes back, so requeueing would spin.
        if let Err(e) = speech.enqueue(text.as_str()) {
            tracing::error!(
                error = ?e,
                alarm_id = ev.id.0,
                label = %ev.payload.label,
                "speech worker unavailable, alarm dropped"
            );
            counter!("alarms_dropped_total").increment(1);
            continue;
        }
        history.push("alarm", &ev.payload.label, &text);
        counter!("alarms_delivered_total").increment(1);
        n += 1;
    }
    n
}

fn sleep_for(queue: &AlarmQueue, now: DateTime<Utc>, idle_tick: Duration) -> Duration {
    match queue.next_fire_at() {
        Some(at) => (at - now).to_std().unwrap_or(Duration::ZERO).min(idle_tick),
        None => idle_tick,
    }
}

pub fn spawn_delivery_loop(
    queue: Arc<AlarmQueue>,
    cache: CacheStore,
    speech: SpeechHandle,
    history: Arc<History>,
    idle_tick: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            deliver_due(&queue, &cache, &speech, &history, now).await;

            let wait = sleep_for(&queue, Utc::now(), idle_tick);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = queue.woken() => {
                    tracing::trace!("delivery loop woken by queue change");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announce::{spawn_speech_worker, RecordingAnnouncer};
    use crate::briefing::AlarmContent;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn payload(label: &str) -> AlarmPayload {
        AlarmPayload {
            label: label.into(),
            content: AlarmContent::LabelOnly,
        }
    }

    #[test]
    fn page_time_schedules_with_policy() {
        let q = AlarmQueue::new();
        let now = Local.with_ymd_and_hms(2020, 10, 20, 15, 0, 0).unwrap();

        let (_, d) = q
            .schedule_for_time("20/10/2020 T 15:25", now, PastTargetPolicy::NextDay, payload("a"))
            .unwrap();
        assert_eq!(d, 25 * 60);

        let (_, d) = q
            .schedule_for_time("20/10/2020 T 14:00", now, PastTargetPolicy::NextDay, payload("b"))
            .unwrap();
        assert_eq!(d, clock::SECS_PER_DAY - 3600);

        let (_, d) = q
            .schedule_for_time("14:00", now, PastTargetPolicy::FireNow, payload("c"))
            .unwrap();
        assert_eq!(d, 0);

        assert!(q
            .schedule_for_time("soon", now, PastTargetPolicy::NextDay, payload("x"))
            .is_err());
        assert_eq!(q.len(), 3);
        assert_eq!(q.list_pending()[0].payload.label, "c");
    }

    #[test]
    fn sleep_is_capped_by_idle_tick() {
        let q = AlarmQueue::new();
        let now = Utc.with_ymd_and_hms(2020, 10, 20, 15, 0, 0).unwrap();
        let tick = Duration::from_secs(60);
        assert_eq!(sleep_for(&q, now, tick), tick);

        q.lock().schedule_at(now, 5, 1, payload("soon"));
        assert_eq!(sleep_for(&q, now, tick), Duration::from_secs(5));
        assert_eq!(
            sleep_for(&q, now + ChronoDuration::seconds(10), tick),
            Duration::ZERO
        );
    }

    #[tokio::test]
    async fn deliver_due_speaks_and_logs() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(tmp.path());
        let rec = Arc::new(RecordingAnnouncer::new());
        let (speech, _task) = spawn_speech_worker(rec.clone());
        let history = History::default();
        let q = AlarmQueue::new();

        let now = Utc::now();
        q.lock().schedule_at(now, 0, 1, payload("Tea"));
        q.lock().schedule_at(now, 3600, 1, payload("Later"));

        assert_eq!(deliver_due(&q, &cache, &speech, &history, now).await, 1);
        speech.speak("sync").await.unwrap();

        assert_eq!(rec.spoken(), ["Tea Has Finished", "sync"]);
        assert_eq!(history.snapshot_last_n(5).len(), 1);
        assert_eq!(q.len(), 1);
    }

    #[tokio::test]
    async fn stopped_worker_drops_due_alarm_without_history() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(tmp.path());
        let (speech, task) = spawn_speech_worker(Arc::new(RecordingAnnouncer::new()));
        task.abort();
        let _ = task.await;

        let history = History::default();
        let q = AlarmQueue::new();
        let now = Utc::now();
        q.lock().schedule_at(now, 0, 1, payload("Tea"));

        assert_eq!(deliver_due(&q, &cache, &speech, &history, now).await, 0);
        assert!(q.is_empty());
        assert!(history.snapshot_last_n(5).is_empty());
    }
}
