//! Spoken announcements.
//!
//! An [`Announcer`] turns text into speech and returns once playback is over.
//! Callers never hold one directly; they go through the speech worker so a
//! web request or refresh tick is not blocked on audio.

pub mod command;
pub mod worker;

use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::config::Settings;

pub use command::CommandAnnouncer;
pub use worker::{spawn_speech_worker, SpeechHandle};

#[async_trait::async_trait]
pub trait Announcer: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Headless hosts: the announcement only goes to the log.
#[derive(Debug, Default, Clone)]
pub struct LogAnnouncer;

#[async_trait::async_trait]
impl Announcer for LogAnnouncer {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::info!(text, "announcement");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// `tts_command = "log"` (or empty) selects the log sink.
pub fn announcer_from_settings(settings: &Settings) -> Arc<dyn Announcer> {
    let cmd = settings.tts_command.trim();
    if cmd.is_empty() || cmd.eq_ignore_ascii_case("log") {
        return Arc::new(LogAnnouncer);
    }
    Arc::new(CommandAnnouncer::from_command_line(cmd))
}

// --- Test helper ---
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    pub spoken: Mutex<Vec<String>>,
}

impl RecordingAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().expect("recording mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl Announcer for RecordingAnnouncer {
    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().expect("recording mutex poisoned").push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
