pub mod covid;
pub mod news;
pub mod weather;

use std::time::Duration;

use anyhow::{Context, Result};
use metrics::histogram;

/// Shared client for all outbound calls; the timeout bounds a slow tick.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("daily-briefing/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building http client")
}

/// Where a provider gets its bytes from.
pub(crate) enum Mode {
    // Own copy so tests need no 'static input.
    Fixture(String),
    Http(reqwest::Client),
}

pub(crate) fn parse_fixture(name: &str, body: &str) -> Result<serde_json::Value> {
    serde_json::from_str(body).with_context(|| format!("parsing {name} fixture"))
}

/// Send, reject non-2xx (keeps the stale cache), decode JSON.
pub(crate) async fn fetch_json(
    name: &'static str,
    req: reqwest::RequestBuilder,
) -> Result<serde_json::Value> {
    let t0 = std::time::Instant::now();
    let resp = req
        .send()
        .await
        .with_context(|| format!("{name} http get()"))?
        .error_for_status()
        .with_context(|| format!("{name} non-2xx"))?;
    let body = resp
        .json::<serde_json::Value>()
        .await
        .with_context(|| format!("{name} json body"))?;
    histogram!("fetch_ms", "source" => name).record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(body)
}
