// src/config/settings.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::clock::PastTargetPolicy;

pub const ENV_CONFIG_PATH: &str = "BRIEFING_CONFIG_PATH";
pub const DEFAULT_THRESHOLD: f64 = 0.3;

fn default_area_type() -> String {
    "nation".to_string()
}
fn default_area_name() -> String {
    "england".to_string()
}
fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}
fn default_news_sources() -> String {
    "bbc-news".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}
fn default_tts_command() -> String {
    "espeak".to_string()
}
fn default_refresh_secs() -> u64 {
    3600
}
fn default_snapshot_secs() -> u64 {
    12 * 3600
}
fn default_delivery_tick_secs() -> u64 {
    60
}
fn default_http_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// "ENV" means: read from WEATHER_API_KEY
    #[serde(default)]
    pub weather_api_key: String,
    #[serde(default)]
    pub weather_city_name: String,
    /// "ENV" means: read from NEWS_API_KEY
    #[serde(default)]
    pub news_api_key: String,
    #[serde(default = "default_area_type")]
    pub covid_area_type: String,
    #[serde(default = "default_area_name")]
    pub covid_area_name: String,
    /// Fraction, 0.3 == 30 %.
    #[serde(default = "default_threshold")]
    pub user_threshold_number: f64,

    #[serde(default = "default_news_sources")]
    pub news_sources: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Program spawned per announcement; "log" only logs the text.
    #[serde(default = "default_tts_command")]
    pub tts_command: String,
    #[serde(default)]
    pub past_alarm_policy: PastTargetPolicy,
    #[serde(default)]
    pub alert_cooldown_secs: i64,
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_snapshot_secs")]
    pub snapshot_interval_secs: u64,
    #[serde(default = "default_delivery_tick_secs")]
    pub delivery_tick_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            weather_api_key: String::new(),
            weather_city_name: String::new(),
            news_api_key: String::new(),
            covid_area_type: default_area_type(),
            covid_area_name: default_area_name(),
            user_threshold_number: default_threshold(),
            news_sources: default_news_sources(),
            data_dir: default_data_dir(),
            bind_addr: default_bind_addr(),
            tts_command: default_tts_command(),
            past_alarm_policy: PastTargetPolicy::default(),
            alert_cooldown_secs: 0,
            refresh_interval_secs: default_refresh_secs(),
            snapshot_interval_secs: default_snapshot_secs(),
            delivery_tick_secs: default_delivery_tick_secs(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl Settings {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_settings(&data, ext.as_str())?;
        cfg.finish()
    }

    /// Load using env var + fallbacks:
    /// 1) $BRIEFING_CONFIG_PATH
    /// 2) config/config.toml
    /// 3) config/config.json
    /// 4) config.json
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in ["config/config.toml", "config/config.json", "config.json"] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from_file(&p);
            }
        }
        Err(anyhow!(
            "no settings found (set {ENV_CONFIG_PATH} or create config/config.toml)"
        ))
    }

    /// Resolve "ENV" keys and sanitize numeric fields.
    fn finish(mut self) -> Result<Self> {
        self.weather_api_key = resolve_key(&self.weather_api_key, "WEATHER_API_KEY")?;
        self.news_api_key = resolve_key(&self.news_api_key, "NEWS_API_KEY")?;

        if !self.user_threshold_number.is_finite() || self.user_threshold_number < 0.0 {
            tracing::warn!(
                threshold = self.user_threshold_number,
                "invalid user_threshold_number, using default"
            );
            self.user_threshold_number = DEFAULT_THRESHOLD;
        }
        self.alert_cooldown_secs = self.alert_cooldown_secs.max(0);
        self.refresh_interval_secs = self.refresh_interval_secs.max(1);
        self.snapshot_interval_secs = self.snapshot_interval_secs.max(1);
        self.delivery_tick_secs = self.delivery_tick_secs.max(1);
        Ok(self)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

fn resolve_key(value: &str, env_name: &str) -> Result<String> {
    if value.trim().eq_ignore_ascii_case("env") {
        return env::var(env_name).map_err(|_| anyhow!("Missing {env_name} env var"));
    }
    Ok(value.trim().to_string())
}

fn parse_settings(s: &str, hint_ext: &str) -> Result<Settings> {
    match hint_ext {
        "toml" => toml::from_str(s).context("parsing settings TOML"),
        "json" => serde_json::from_str(s).context("parsing settings JSON"),
        _ => {
            if let Ok(v) = serde_json::from_str(s) {
                return Ok(v);
            }
            toml::from_str(s).map_err(|_| anyhow!("unsupported settings format"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_with_original_keys_and_defaults() {
        let s = r#"{
            "weather_api_key": "w",
            "weather_city_name": "Exeter",
            "news_api_key": "n",
            "covid_area_type": "ltla",
            "covid_area_name": "Exeter",
            "user_threshold_number": 0.25
        }"#;
        let cfg = parse_settings(s, "json").unwrap().finish().unwrap();
        assert_eq!(cfg.weather_city_name, "Exeter");
        assert_eq!(cfg.covid_area_type, "ltla");
        assert_eq!(cfg.user_threshold_number, 0.25);
        assert_eq!(cfg.news_sources, "bbc-news");
        assert_eq!(cfg.past_alarm_policy, PastTargetPolicy::NextDay);
        assert_eq!(cfg.refresh_interval_secs, 3600);
    }

    #[test]
    fn toml_policy_and_bad_threshold() {
        let s = r#"
weather_api_key = "w"
news_api_key = "n"
user_threshold_number = -2.0
past_alarm_policy = "fire_now"
alert_cooldown_secs = -5
"#;
        let cfg = parse_settings(s, "toml").unwrap().finish().unwrap();
        assert_eq!(cfg.user_threshold_number, DEFAULT_THRESHOLD);
        assert_eq!(cfg.past_alarm_policy, PastTargetPolicy::FireNow);
        assert_eq!(cfg.alert_cooldown_secs, 0);
        assert_eq!(cfg.covid_area_name, "england");
    }

    #[test]
    fn unknown_extension_sniffs_content() {
        let cfg = parse_settings(r#"news_api_key = "abc""#, "").unwrap();
        assert_eq!(cfg.news_api_key, "abc");
        assert!(parse_settings("<xml/>", "").is_err());
    }
}
