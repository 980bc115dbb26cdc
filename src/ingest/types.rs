// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cache::CacheDoc;

/// A remote source whose JSON response is cached verbatim.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self) -> Result<serde_json::Value>;
    fn name(&self) -> &'static str;
    fn doc(&self) -> CacheDoc;
}

// --- typed views over the cached documents ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherDoc {
    pub main: WeatherMain,
    #[serde(default)]
    pub weather: Vec<WeatherItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherMain {
    pub temp: f64,
    pub feels_like: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherItem {
    pub main: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsDoc {
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CovidDoc {
    pub data: Vec<CovidDay>,
}

/// One day of case data; the dashboard API reports recent deaths as null.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CovidDay {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub new_cases_by_publish_date: Option<i64>,
    #[serde(default)]
    pub cum_cases_by_publish_date: Option<i64>,
    #[serde(default)]
    pub new_deaths_by_death_date: Option<i64>,
    #[serde(default)]
    pub cum_deaths_by_death_date: Option<i64>,
}

impl CovidDay {
    pub fn has_deaths(&self) -> bool {
        self.new_deaths_by_death_date.is_some() || self.cum_deaths_by_death_date.is_some()
    }
}
