//! Speak the cached weather + news briefing once and exit.
//! Handy for checking the speech engine without waiting for an alarm.

use daily_briefing::{
    announce, briefing::{self, AlarmContent}, cache::CacheStore, Settings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let settings = Settings::load_default()?;
    let cache = CacheStore::new(&settings.data_dir);
    let announcer = announce::announcer_from_settings(&settings);
    let (speech, _worker) = announce::spawn_speech_worker(announcer);

    let label = std::env::args().nth(1).unwrap_or_else(|| "Good morning".to_string());
    let text = briefing::compose(AlarmContent::WeatherAndNews, &label, &cache).await;
    speech.speak(text).await?;

    println!("speak-briefing done");
    Ok(())
}
