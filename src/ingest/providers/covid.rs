use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::json;

use super::{fetch_json, parse_fixture, Mode};
use crate::cache::CacheDoc;
use crate::config::Settings;
use crate::ingest::types::{CovidDoc, Fetcher};

const COVID_URL: &str = "https://api.coronavirus.data.gov.uk/v1/data";

/// Public-health dashboard: new/cumulative cases and deaths for one area,
/// newest day first.
pub struct CovidProvider {
    mode: Mode,
    area_type: String,
    area_name: String,
}

impl CovidProvider {
    pub fn from_settings(settings: &Settings, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http(client),
            area_type: settings.covid_area_type.clone(),
            area_name: settings.covid_area_name.clone(),
        }
    }

    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            area_type: String::new(),
            area_name: String::new(),
        }
    }

    /// `filters` query value, `;`-separated.
    pub fn filters(&self) -> String {
        format!("areaType={};areaName={}", self.area_type, self.area_name)
    }

    /// `structure` query value: output field -> metric.
    pub fn structure() -> serde_json::Value {
        json!({
            "date": "date",
            "newCasesByPublishDate": "newCasesByPublishDate",
            "cumCasesByPublishDate": "cumCasesByPublishDate",
            "newDeathsByDeathDate": "newDeathsByDeathDate",
            "cumDeathsByDeathDate": "cumDeathsByDeathDate"
        })
    }
}

#[async_trait]
impl Fetcher for CovidProvider {
    async fn fetch(&self) -> Result<serde_json::Value> {
        let body = match &self.mode {
            Mode::Fixture(s) => parse_fixture("covid", s)?,
            Mode::Http(client) => {
                let req = client.get(COVID_URL).query(&[
                    ("filters", self.filters()),
                    ("structure", Self::structure().to_string()),
                ]);
                fetch_json("covid", req).await?
            }
        };
        let doc: CovidDoc =
            serde_json::from_value(body.clone()).context("covid payload shape")?;
        if doc.data.is_empty() {
            bail!("covid payload has no data rows");
        }
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "covid"
    }

    fn doc(&self) -> CacheDoc {
        CacheDoc::Covid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_values_follow_dashboard_contract() {
        let s = Settings {
            covid_area_type: "ltla".into(),
            covid_area_name: "Exeter".into(),
            ..Settings::default()
        };
        let p = CovidProvider::from_settings(&s, reqwest::Client::new());
        assert_eq!(p.filters(), "areaType=ltla;areaName=Exeter");
        let st = CovidProvider::structure();
        assert_eq!(st["newDeathsByDeathDate"], "newDeathsByDeathDate");
    }

    #[tokio::test]
    async fn empty_data_is_rejected() {
        let p = CovidProvider::from_fixture(r#"{"data": []}"#);
        assert!(p.fetch().await.is_err());
    }
}
