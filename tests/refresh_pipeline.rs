// tests/refresh_pipeline.rs
//
// Startup + hourly cycle with fixture-backed fetchers (no network).

use std::sync::Arc;

use daily_briefing::announce::{spawn_speech_worker, RecordingAnnouncer};
use daily_briefing::cache::{CacheDoc, CacheStore};
use daily_briefing::change_detector::CaseAlert;
use daily_briefing::history::History;
use daily_briefing::ingest::providers::{
    covid::CovidProvider, news::NewsProvider, weather::WeatherProvider,
};
use daily_briefing::ingest::scheduler::RefreshJobs;
use daily_briefing::ingest::types::Fetcher;
use daily_briefing::notify;

fn fixture_fetchers(covid: &str) -> Vec<Box<dyn Fetcher>> {
    vec![
        Box::new(WeatherProvider::from_fixture(include_str!("fixtures/weather.json"))),
        Box::new(NewsProvider::from_fixture(include_str!("fixtures/news.json"))),
        Box::new(CovidProvider::from_fixture(covid)),
    ]
}

#[tokio::test]
async fn startup_populates_every_cache_file_without_alerting() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(tmp.path());
    let rec = Arc::new(RecordingAnnouncer::new());
    let (speech, _worker) = spawn_speech_worker(rec.clone());

    let jobs = RefreshJobs::new(
        fixture_fetchers(include_str!("fixtures/covid.json")),
        cache.clone(),
        speech.clone(),
        Arc::new(History::default()),
        CaseAlert::new(0.3, 0),
    );
    jobs.startup().await;

    for doc in [
        CacheDoc::Weather,
        CacheDoc::News,
        CacheDoc::Covid,
        CacheDoc::Notifications,
        CacheDoc::CaseSnapshot,
    ] {
        assert!(cache.path_of(doc).exists(), "{} missing", doc.file_name());
    }
    assert_eq!(notify::load_notifications(&cache).await.unwrap().len(), 4);

    // Fresh snapshot equals today's count, so no alert.
    speech.speak("sync").await.unwrap();
    assert_eq!(rec.spoken(), ["sync"]);
}

#[tokio::test]
async fn refresh_tick_alerts_against_older_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(tmp.path());
    let rec = Arc::new(RecordingAnnouncer::new());
    let (speech, _worker) = spawn_speech_worker(rec.clone());
    let history = Arc::new(History::default());

    std::fs::write(cache.path_of(CacheDoc::CaseSnapshot), "100").unwrap();
    let jobs = RefreshJobs::new(
        fixture_fetchers(include_str!("fixtures/covid.json")),
        cache.clone(),
        speech.clone(),
        history.clone(),
        CaseAlert::new(0.3, 0),
    );
    jobs.refresh_tick().await;
    speech.speak("sync").await.unwrap();

    let spoken = rec.spoken();
    assert_eq!(spoken.len(), 2);
    assert!(spoken[0].starts_with("COVID Alert"));

    // Snapshot tick moves the baseline forward; the next check is quiet.
    jobs.snapshot_tick().await;
    jobs.case_check().await;
    speech.speak("sync").await.unwrap();
    assert_eq!(rec.spoken().len(), 3);
    assert_eq!(history.snapshot_last_n(10).len(), 1);
}

#[tokio::test]
async fn failing_source_keeps_stale_cache_and_other_sources_refresh() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(tmp.path());
    let (speech, _worker) = spawn_speech_worker(Arc::new(RecordingAnnouncer::new()));

    std::fs::write(
        cache.path_of(CacheDoc::Covid),
        include_str!("fixtures/covid_null_deaths.json"),
    )
    .unwrap();
    let jobs = RefreshJobs::new(
        fixture_fetchers(r#"{"data": []}"#),
        cache.clone(),
        speech,
        Arc::new(History::default()),
        CaseAlert::new(0.3, 0),
    );
    jobs.startup().await;

    let covid = std::fs::read_to_string(cache.path_of(CacheDoc::Covid)).unwrap();
    assert!(covid.contains("18804"));
    let notes = notify::load_notifications(&cache).await.unwrap();
    assert!(notes[0].content.contains("Today's New Deaths: 97"));
}
