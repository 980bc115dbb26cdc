use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{fetch_json, parse_fixture, Mode};
use crate::cache::CacheDoc;
use crate::config::Settings;
use crate::ingest::types::{Fetcher, NewsDoc};

const NEWS_URL: &str = "https://newsapi.org/v2/top-headlines";

/// NewsAPI top headlines for the configured sources.
pub struct NewsProvider {
    mode: Mode,
    sources: String,
    api_key: String,
}

impl NewsProvider {
    pub fn from_settings(settings: &Settings, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http(client),
            sources: settings.news_sources.clone(),
            api_key: settings.news_api_key.clone(),
        }
    }

    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            sources: String::new(),
            api_key: String::new(),
        }
    }
}

#[async_trait]
impl Fetcher for NewsProvider {
    async fn fetch(&self) -> Result<serde_json::Value> {
        let body = match &self.mode {
            Mode::Fixture(s) => parse_fixture("news", s)?,
            Mode::Http(client) => {
                let req = client.get(NEWS_URL).query(&[
                    ("sources", self.sources.as_str()),
                    ("apiKey", self.api_key.as_str()),
                ]);
                fetch_json("news", req).await?
            }
        };
        serde_json::from_value::<NewsDoc>(body.clone()).context("news payload shape")?;
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "news"
    }

    fn doc(&self) -> CacheDoc {
        CacheDoc::News
    }
}
