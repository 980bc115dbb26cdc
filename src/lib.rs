// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod alarm;
pub mod announce;
pub mod api;
pub mod app;
pub mod briefing;
pub mod cache;
pub mod clock;
pub mod config;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod render;

// Case alerts
pub mod antiflutter;
pub mod change_detector;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::app::Briefing;
pub use crate::config::Settings;
pub use crate::notify::NotificationRecord;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over the default filter;
/// `BRIEFING_LOG_JSON=1` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("daily_briefing=info,warn"));

    let json = std::env::var("BRIEFING_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}
