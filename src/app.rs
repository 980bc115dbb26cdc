//! Wiring: shared state, background tasks and the router.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;

use crate::alarm::{spawn_delivery_loop, AlarmQueue};
use crate::announce::{spawn_speech_worker, Announcer, SpeechHandle};
use crate::api::{self, AppState};
use crate::cache::CacheStore;
use crate::change_detector::CaseAlert;
use crate::config::Settings;
use crate::history::History;
use crate::ingest::scheduler::{RefreshCfg, RefreshJobs};
use crate::ingest::types::Fetcher;

pub struct Briefing {
    pub state: AppState,
    pub jobs: Arc<RefreshJobs>,
    pub speech: SpeechHandle,
    delivery_tick: Duration,
    refresh: RefreshCfg,
    _speech_task: JoinHandle<()>,
}

impl Briefing {
    /// Must run inside a tokio runtime: the speech worker starts here.
    pub fn new(settings: &Settings, fetchers: Vec<Box<dyn Fetcher>>, announcer: Arc<dyn Announcer>) -> Self {
        let cache = CacheStore::new(&settings.data_dir);
        let history = Arc::new(History::with_capacity(200));
        let (speech, speech_task) = spawn_speech_worker(announcer);

        let jobs = Arc::new(RefreshJobs::new(
            fetchers,
            cache.clone(),
            speech.clone(),
            history.clone(),
            CaseAlert::new(settings.user_threshold_number, settings.alert_cooldown_secs),
        ));

        let state = AppState {
            alarms: Arc::new(AlarmQueue::new()),
            cache,
            history,
            policy: settings.past_alarm_policy,
        };

        Self {
            state,
            jobs,
            speech,
            delivery_tick: Duration::from_secs(settings.delivery_tick_secs),
            refresh: RefreshCfg::from_settings(settings),
            _speech_task: speech_task,
        }
    }

    pub fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Delivery loop plus the periodic refresh loops.
    pub fn spawn_background(&self) -> Vec<JoinHandle<()>> {
        let mut tasks = vec![spawn_delivery_loop(
            self.state.alarms.clone(),
            self.state.cache.clone(),
            self.speech.clone(),
            self.state.history.clone(),
            self.delivery_tick,
        )];
        tasks.extend(self.jobs.clone().spawn(self.refresh));
        tasks
    }
}
