//! Wall-clock helpers for alarm targets.
//!
//! The page form sends a bare `HH:MM`; the older `<date> T <HH:MM>` shape is
//! still accepted and its date part ignored. Alarms are within the next 24 h.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Timelike};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const SECS_PER_DAY: u64 = 24 * 3600;

/// What to do with an alarm whose time of day has already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PastTargetPolicy {
    /// Same time tomorrow.
    #[default]
    NextDay,
    /// Delay clamped to zero; delivered on the next poll.
    FireNow,
}

/// Seconds since midnight for the `HH:MM` after the last `T` separator.
///
/// `hhmm_to_seconds("20/10/2020 T 15:25") == 55500`
pub fn hhmm_to_seconds(value: &str) -> Result<u64> {
    static RE_HHMM: OnceCell<Regex> = OnceCell::new();
    let re = RE_HHMM.get_or_init(|| Regex::new(r"^\s*(\d{1,2})\s*:\s*(\d{2})\s*$").unwrap());

    let time_part = value.rsplit('T').next().unwrap_or(value);
    let caps = match re.captures(time_part) {
        Some(c) => c,
        None => bail!("not a HH:MM time: {value:?}"),
    };
    let hours: u64 = caps[1]
        .parse()
        .with_context(|| format!("hours in {value:?}"))?;
    let minutes: u64 = caps[2]
        .parse()
        .with_context(|| format!("minutes in {value:?}"))?;
    if hours > 23 || minutes > 59 {
        bail!("time out of range: {value:?}");
    }
    Ok(hours * 3600 + minutes * 60)
}

pub fn seconds_since_midnight(now: &DateTime<Local>) -> u64 {
    u64::from(now.num_seconds_from_midnight())
}

/// `dd/mm/YYYY T HH:MM`, the format the page and `hhmm_to_seconds` share.
pub fn current_time_string() -> String {
    format_page_time(&Local::now())
}

pub fn format_page_time(t: &DateTime<Local>) -> String {
    t.format("%d/%m/%Y T %H:%M").to_string()
}

/// Seconds from `now_secs` until `target_secs` (both since midnight).
pub fn delay_until(target_secs: u64, now_secs: u64, policy: PastTargetPolicy) -> u64 {
    if target_secs >= now_secs {
        return target_secs - now_secs;
    }
    match policy {
        PastTargetPolicy::NextDay => SECS_PER_DAY - now_secs + target_secs,
        PastTargetPolicy::FireNow => 0,
    }
}
