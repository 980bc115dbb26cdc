// tests/alarm_queue.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use daily_briefing::alarm::{spawn_delivery_loop, AlarmPayload, AlarmQueue, AlarmScheduler};
use daily_briefing::announce::{spawn_speech_worker, RecordingAnnouncer};
use daily_briefing::briefing::AlarmContent;
use daily_briefing::cache::{CacheDoc, CacheStore};
use daily_briefing::clock::hhmm_to_seconds;
use daily_briefing::history::History;

fn payload(label: &str, content: AlarmContent) -> AlarmPayload {
    AlarmPayload {
        label: label.into(),
        content,
    }
}

#[test]
fn time_conversion() {
    assert_eq!(hhmm_to_seconds("20/10/2020 T 15:25").unwrap(), 55_500);
}

#[test]
fn queue_is_empty_on_start() {
    assert!(AlarmScheduler::new().is_empty());
    assert!(AlarmQueue::new().is_empty());
}

#[test]
fn delays_50_10_30_pop_as_10_30_50() {
    let now = Utc.with_ymd_and_hms(2020, 10, 20, 15, 25, 0).unwrap();
    let mut q = AlarmScheduler::new();
    for d in [50u64, 10, 30] {
        q.schedule_at(now, d, 1, payload(&format!("{d}"), AlarmContent::LabelOnly));
    }

    let pending: Vec<String> = q.list_pending().into_iter().map(|e| e.payload.label).collect();
    assert_eq!(pending, ["10", "30", "50"]);

    let mut popped = Vec::new();
    let at = now + ChronoDuration::seconds(100);
    while let Some(ev) = q.pop_due(at) {
        popped.push(ev.payload.label);
    }
    assert_eq!(popped, ["10", "30", "50"]);
}

#[test]
fn pop_due_respects_wall_clock() {
    let now = Utc.with_ymd_and_hms(2020, 10, 20, 15, 25, 0).unwrap();
    let mut q = AlarmScheduler::new();
    q.schedule_at(now, 10, 1, payload("a", AlarmContent::LabelOnly));
    q.schedule_at(now, 30, 1, payload("b", AlarmContent::LabelOnly));

    let t = now + ChronoDuration::seconds(15);
    assert_eq!(q.peek_due(t).map(|e| e.payload.label.as_str()), Some("a"));
    assert_eq!(q.pop_due(t).unwrap().payload.label, "a");
    assert!(q.pop_due(t).is_none());
    assert_eq!(q.len(), 1);
}

#[tokio::test]
async fn delivery_loop_fires_without_any_request() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(tmp.path());
    std::fs::write(
        cache.path_of(CacheDoc::Weather),
        include_str!("fixtures/weather.json"),
    )
    .unwrap();

    let rec = Arc::new(RecordingAnnouncer::new());
    let (speech, _worker) = spawn_speech_worker(rec.clone());
    let queue = Arc::new(AlarmQueue::new());
    let history = Arc::new(History::default());

    let _loop = spawn_delivery_loop(
        queue.clone(),
        cache,
        speech,
        history.clone(),
        Duration::from_secs(3600),
    );

    // Scheduled after the loop went to sleep; the wake-up must pick it up.
    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.schedule(0, 1, payload("Morning", AlarmContent::Weather));

    let mut spoken = Vec::new();
    for _ in 0..100 {
        spoken = rec.spoken();
        if !spoken.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(
        spoken,
        ["Morning. The current temperature is: 13C. Feels like: 11C. Clouds"]
    );
    assert!(queue.is_empty());
    assert_eq!(history.snapshot_last_n(10)[0].label, "Morning");
}
