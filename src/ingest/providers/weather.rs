use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{fetch_json, parse_fixture, Mode};
use crate::cache::CacheDoc;
use crate::config::Settings;
use crate::ingest::types::{Fetcher, WeatherDoc};

const WEATHER_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

/// OpenWeatherMap current conditions for one city, metric units.
pub struct WeatherProvider {
    mode: Mode,
    city: String,
    api_key: String,
}

impl WeatherProvider {
    pub fn from_settings(settings: &Settings, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http(client),
            city: settings.weather_city_name.clone(),
            api_key: settings.weather_api_key.clone(),
        }
    }

    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            city: String::new(),
            api_key: String::new(),
        }
    }
}

#[async_trait]
impl Fetcher for WeatherProvider {
    async fn fetch(&self) -> Result<serde_json::Value> {
        let body = match &self.mode {
            Mode::Fixture(s) => parse_fixture("weather", s)?,
            Mode::Http(client) => {
                let req = client.get(WEATHER_URL).query(&[
                    ("q", self.city.as_str()),
                    ("units", "metric"),
                    ("appid", self.api_key.as_str()),
                ]);
                fetch_json("weather", req).await?
            }
        };
        // Refuse to overwrite the cache with an error document.
        serde_json::from_value::<WeatherDoc>(body.clone()).context("weather payload shape")?;
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "weather"
    }

    fn doc(&self) -> CacheDoc {
        CacheDoc::Weather
    }
}
