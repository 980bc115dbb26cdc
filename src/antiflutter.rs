// src/antiflutter.rs
use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Cooldown gate for spoken case alerts.
/// - First alert always allowed.
/// - Inside cooldown, alerts are suppressed.
/// - State is updated explicitly via `record_alert` after the alert is queued.
#[derive(Debug, Clone, Default)]
pub struct AntiFlutter {
    cooldown: ChronoDuration,
    last_alert_ts: Option<DateTime<Utc>>,
}

impl AntiFlutter {
    /// `cooldown_secs` <= 0 disables the gate.
    pub fn new(cooldown_secs: i64) -> Self {
        Self {
            cooldown: ChronoDuration::seconds(cooldown_secs.clamp(0, i64::MAX / 1_000)),
            last_alert_ts: None,
        }
    }

    /// Does NOT mutate state.
    pub fn should_alert(&self, now: DateTime<Utc>) -> bool {
        match self.last_alert_ts {
            None => true,
            Some(ts) => now.signed_duration_since(ts) >= self.cooldown,
        }
    }

    pub fn record_alert(&mut self, now: DateTime<Utc>) {
        self.last_alert_ts = Some(now);
    }

    pub fn last_alert(&self) -> Option<DateTime<Utc>> {
        self.last_alert_ts
    }
}
