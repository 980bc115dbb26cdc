//! Daily Briefing binary entrypoint.
//! Loads settings, starts the background jobs and serves the dashboard.

use anyhow::{Context, Result};
use tracing::info;

use daily_briefing::{announce, ingest, init_tracing, metrics::Metrics, Briefing, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::load_default()?;
    info!(
        city = %settings.weather_city_name,
        area = %settings.covid_area_name,
        data_dir = %settings.data_dir.display(),
        "settings loaded"
    );

    let metrics = Metrics::init()?;
    let fetchers = ingest::default_fetchers(&settings)?;
    let announcer = announce::announcer_from_settings(&settings);
    info!(engine = announcer.name(), "speech engine selected");

    let briefing = Briefing::new(&settings, fetchers, announcer);
    briefing.state.cache.ensure_dir().await?;

    briefing.jobs.startup().await;
    let _tasks = briefing.spawn_background();

    let app = briefing.router().merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    info!(addr = %settings.bind_addr, "dashboard listening on /index");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down; pending alarms are dropped");
        })
        .await
        .context("http server")?;
    Ok(())
}
