//! Notification cards shown on the dashboard.
//!
//! The set is derived: one COVID summary followed by one card per news
//! article, recomputed from the caches and written to `notifications.json`.

pub mod covid;

use anyhow::{Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheDoc, CacheStore};
use crate::ingest::types::{Article, CovidDoc, NewsDoc};

pub use covid::COVID_TITLE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub title: String,
    /// HTML fragment; news cards carry a link.
    pub content: String,
}

pub fn hyperlink(url: &str, text: &str) -> String {
    format!(
        "<a href='{}'>{}</a>",
        html_escape::encode_single_quoted_attribute(url),
        html_escape::encode_text(text)
    )
}

fn article_record(a: &Article) -> NotificationRecord {
    NotificationRecord {
        title: a.title.clone(),
        content: hyperlink(&a.url, a.description.as_deref().unwrap_or_default()),
    }
}

/// COVID record first, then articles in source order.
pub fn build_notifications(news: &NewsDoc, covid: &CovidDoc) -> Result<Vec<NotificationRecord>> {
    let mut out = Vec::with_capacity(news.articles.len() + 1);
    out.push(NotificationRecord {
        title: COVID_TITLE.to_string(),
        content: covid::covid_content(covid)?,
    });
    out.extend(news.articles.iter().map(article_record));
    Ok(out)
}

/// Rebuild from the news and COVID caches and overwrite `notifications.json`.
/// Nothing is written unless both inputs parse.
pub async fn rebuild(cache: &CacheStore) -> Result<Vec<NotificationRecord>> {
    let guard = cache.lock().await;
    let news: NewsDoc = guard.read_json(CacheDoc::News).await?;
    let covid: CovidDoc = guard.read_json(CacheDoc::Covid).await?;
    let records = build_notifications(&news, &covid).context("building notifications")?;
    guard.write_json(CacheDoc::Notifications, &records).await?;
    drop(guard);

    counter!("notifications_rebuilt_total").increment(1);
    tracing::info!(count = records.len(), "notifications rebuilt");
    Ok(records)
}

pub async fn load_notifications(cache: &CacheStore) -> Result<Vec<NotificationRecord>> {
    cache.read_json(CacheDoc::Notifications).await
}

/// Remove the first record titled `title`; order of the rest is kept.
pub fn remove_first_titled(records: &mut Vec<NotificationRecord>, title: &str) -> bool {
    match records.iter().position(|r| r.title == title) {
        Some(i) => {
            records.remove(i);
            true
        }
        None => false,
    }
}

/// Dismiss until the next rebuild. Returns whether a record was removed.
pub async fn dismiss_notification(cache: &CacheStore, title: &str) -> Result<bool> {
    let guard = cache.lock().await;
    let mut records: Vec<NotificationRecord> = guard.read_json(CacheDoc::Notifications).await?;
    let removed = remove_first_titled(&mut records, title);
    if removed {
        guard.write_json(CacheDoc::Notifications, &records).await?;
        tracing::info!(title, "notification dismissed until next rebuild");
    } else {
        tracing::debug!(title, "no notification to dismiss");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(t: &str) -> NotificationRecord {
        NotificationRecord {
            title: t.into(),
            content: String::new(),
        }
    }

    #[test]
    fn hyperlink_escapes_both_parts() {
        let h = hyperlink("https://x/?b='2'", "Tom & <Jerry>");
        assert!(h.starts_with("<a href='https://x/?b="));
        assert!(!h.contains("'2'"));
        assert!(h.ends_with("'>Tom &amp; &lt;Jerry&gt;</a>"));
    }

    #[test]
    fn remove_first_only_and_keep_order() {
        let mut v = vec![rec("a"), rec("b"), rec("c"), rec("b")];
        assert!(remove_first_titled(&mut v, "b"));
        let titles: Vec<_> = v.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["a", "c", "b"]);
        assert!(!remove_first_titled(&mut v, "zzz"));
        assert_eq!(v.len(), 3);
    }
}
