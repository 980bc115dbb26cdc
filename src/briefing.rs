//! Spoken briefing text built from the caches.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheDoc, CacheStore};
use crate::ingest::types::{NewsDoc, WeatherDoc};

/// What an alarm reads out when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmContent {
    Weather,
    News,
    WeatherAndNews,
    LabelOnly,
}

impl AlarmContent {
    /// From the page's two checkboxes.
    pub fn from_flags(weather: bool, news: bool) -> Self {
        match (weather, news) {
            (true, true) => AlarmContent::WeatherAndNews,
            (true, false) => AlarmContent::Weather,
            (false, true) => AlarmContent::News,
            (false, false) => AlarmContent::LabelOnly,
        }
    }
}

pub fn weather_summary(doc: &WeatherDoc) -> String {
    let forecast = doc
        .weather
        .first()
        .map(|w| w.main.as_str())
        .unwrap_or("No forecast available");
    format!(
        "The current temperature is: {}C. Feels like: {}C. {}",
        doc.main.temp.trunc() as i64,
        doc.main.feels_like.trunc() as i64,
        forecast
    )
}

pub fn headlines(doc: &NewsDoc) -> Vec<String> {
    doc.articles.iter().map(|a| a.title.clone()).collect()
}

pub fn finished_text(label: &str) -> String {
    format!("{label} Has Finished")
}

async fn compose_from_cache(content: AlarmContent, label: &str, cache: &CacheStore) -> Result<String> {
    let guard = cache.lock().await;
    let text = match content {
        AlarmContent::LabelOnly => finished_text(label),
        AlarmContent::Weather => {
            let w: WeatherDoc = guard.read_json(CacheDoc::Weather).await?;
            format!("{label}. {}", weather_summary(&w))
        }
        AlarmContent::News => {
            let n: NewsDoc = guard.read_json(CacheDoc::News).await?;
            format!("{label}. Here are the headlines. {}", headlines(&n).join(". "))
        }
        AlarmContent::WeatherAndNews => {
            let w: WeatherDoc = guard.read_json(CacheDoc::Weather).await?;
            let n: NewsDoc = guard.read_json(CacheDoc::News).await?;
            format!(
                "{label}. {} Here are the headlines. {}",
                weather_summary(&w),
                headlines(&n).join(". ")
            )
        }
    };
    Ok(text)
}

/// Alarm text at delivery time. An unreadable cache falls back to the label.
pub async fn compose(content: AlarmContent, label: &str, cache: &CacheStore) -> String {
    match compose_from_cache(content, label, cache).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = ?e, label, "briefing cache unreadable, announcing label only");
            finished_text(label)
        }
    }
}
