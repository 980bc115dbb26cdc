//! history.rs: in-memory log of delivered announcements for the page and `/api/history`.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub ts: DateTime<Utc>,
    /// "alarm" | "covid-alert"
    pub kind: &'static str,
    pub label: String,
    pub text: String,
}

#[derive(Debug)]
pub struct History {
    inner: Mutex<Vec<HistoryEntry>>,
    cap: usize,
}

impl History {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(10_000))),
            cap: cap.min(10_000),
        }
    }

    pub fn push(&self, kind: &'static str, label: &str, text: &str) {
        let entry = HistoryEntry {
            ts: Utc::now(),
            kind,
            label: label.to_string(),
            text: text.to_string(),
        };

        let mut v = self.inner.lock().expect("history mutex poisoned");
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    pub fn snapshot_last_n(&self, n: usize) -> Vec<HistoryEntry> {
        let v = self.inner.lock().expect("history mutex poisoned");
        let len = v.len();
        let start = len.saturating_sub(n);
        v[start..].to_vec()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_newest_within_cap() {
        let h = History::with_capacity(2);
        h.push("alarm", "a", "1");
        h.push("alarm", "b", "2");
        h.push("alarm", "c", "3");
        let labels: Vec<_> = h.snapshot_last_n(10).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, ["b", "c"]);
        assert_eq!(h.snapshot_last_n(1)[0].label, "c");
    }
}
