use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::alarm::{AlarmHandle, AlarmPayload, AlarmQueue};
use crate::briefing::AlarmContent;
use crate::cache::CacheStore;
use crate::clock::{self, PastTargetPolicy};
use crate::history::{History, HistoryEntry};
use crate::notify::{self, NotificationRecord};
use crate::render::{render_index, AlarmView, Page};

#[derive(Clone)]
pub struct AppState {
    pub alarms: Arc<AlarmQueue>,
    pub cache: CacheStore,
    pub history: Arc<History>,
    pub policy: PastTargetPolicy,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/index") }))
        .route("/index", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/api/alarms", get(api_alarms))
        .route("/api/notifications", get(api_notifications))
        .route("/api/notifications/rebuild", post(api_rebuild))
        .route("/api/history", get(api_history))
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// --- operations the page is built on ---

pub fn schedule_alarm(state: &AppState, target: &str, payload: AlarmPayload) -> Result<AlarmHandle> {
    let (handle, _delay) = state
        .alarms
        .schedule_for_time(target, Local::now(), state.policy, payload)?;
    Ok(handle)
}

pub fn list_pending_alarms(state: &AppState) -> Vec<AlarmView> {
    state.alarms.list_pending().iter().map(AlarmView::from).collect()
}

pub async fn rebuild_notifications(state: &AppState) -> Result<Vec<NotificationRecord>> {
    notify::rebuild(&state.cache).await
}

pub async fn dismiss_notification(state: &AppState, title: &str) -> Result<bool> {
    notify::dismiss_notification(&state.cache, title).await
}

// --- handlers ---

#[derive(Debug, Default, Deserialize)]
struct IndexQuery {
    alarm: Option<String>,
    weather: Option<String>,
    news: Option<String>,
    two: Option<String>,
    notif: Option<String>,
    cancel: Option<String>,
    /// Render-only; set by the redirect after a rejected alarm.
    error: Option<String>,
}

impl IndexQuery {
    fn changes_state(&self) -> bool {
        present(&self.alarm).is_some()
            || present(&self.cancel).is_some()
            || self.notif.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Redirect target after an alarm was rejected.
pub const BAD_ALARM_REDIRECT: &str = "/index?error=bad_alarm";

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn banner_for(code: &str) -> Option<&'static str> {
    match code {
        "bad_alarm" => Some("Could not set alarm: pick a time of day as HH:MM."),
        _ => None,
    }
}

/// Actions arrive as query parameters; once applied the browser is sent back
/// to a clean `/index` so the page's auto-refresh cannot replay them.
async fn index(State(state): State<AppState>, Query(q): Query<IndexQuery>) -> Response {
    if q.changes_state() {
        return apply_actions(&state, &q).await.into_response();
    }
    render_page(&state, q.error.as_deref().and_then(banner_for))
        .await
        .into_response()
}

async fn apply_actions(state: &AppState, q: &IndexQuery) -> Redirect {
    let mut rejected = false;

    if let Some(target) = present(&q.alarm) {
        let label = present(&q.two).unwrap_or("Alarm").to_string();
        let content = AlarmContent::from_flags(present(&q.weather).is_some(), present(&q.news).is_some());
        if let Err(e) = schedule_alarm(state, target, AlarmPayload { label, content }) {
            tracing::warn!(error = ?e, alarm_time = target, "alarm rejected");
            rejected = true;
        }
    }

    if let Some(id) = present(&q.cancel) {
        match id.parse::<u64>() {
            Ok(id) => {
                if state.alarms.cancel(AlarmHandle(id)) {
                    tracing::info!(alarm_id = id, "alarm cancelled");
                }
            }
            Err(_) => tracing::debug!(id, "ignoring malformed cancel id"),
        }
    }

    if let Some(title) = q.notif.as_deref().filter(|s| !s.is_empty()) {
        if let Err(e) = dismiss_notification(state, title).await {
            tracing::warn!(error = ?e, title, "dismiss failed");
        }
    }

    if rejected {
        Redirect::to(BAD_ALARM_REDIRECT)
    } else {
        Redirect::to("/index")
    }
}

async fn render_page(state: &AppState, banner: Option<&str>) -> Html<String> {
    let notifications = notify::load_notifications(&state.cache)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = ?e, "notifications unavailable");
            Vec::new()
        });
    let alarms = list_pending_alarms(state);
    let now = clock::current_time_string();

    Html(render_index(&Page {
        now: &now,
        alarms: &alarms,
        notifications: &notifications,
        banner,
    }))
}

async fn api_alarms(State(state): State<AppState>) -> Json<Vec<AlarmView>> {
    Json(list_pending_alarms(&state))
}

async fn api_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationRecord>>, (StatusCode, String)> {
    notify::load_notifications(&state.cache)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, format!("{e:#}")))
}

#[derive(Serialize)]
struct RebuildOut {
    count: usize,
}

async fn api_rebuild(State(state): State<AppState>) -> Result<Json<RebuildOut>, (StatusCode, String)> {
    match rebuild_notifications(&state).await {
        Ok(v) => Ok(Json(RebuildOut { count: v.len() })),
        Err(e) => {
            tracing::warn!(error = ?e, "manual rebuild failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))
        }
    }
}

async fn api_history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    Json(state.history.snapshot_last_n(50))
}
