// HTTP handlers: lifecycle, queries, snapshots, alerts, export/import

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::config::ConfigPatch;
use crate::error::ProfilerError;
use crate::models::{MemoryMeasurement, PerformanceEntry, TimelineEventType};
use crate::version::{NAME, VERSION};

/// Maps engine errors to status codes with a `{"error": ...}` body.
pub(super) struct ApiError(ProfilerError);

impl From<ProfilerError> for ApiError {
    fn from(e: ProfilerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ProfilerError::Import(_) | ProfilerError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            ProfilerError::SnapshotNotFound(_) => StatusCode::NOT_FOUND,
            ProfilerError::NoRuntime | ProfilerError::Serialize(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::warn!(error = %self.0, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/state — run state, capabilities and the headline numbers for a panel.
pub(super) async fn state_handler(State(state): State<AppState>) -> impl IntoResponse {
    let p = &state.profiler;
    Json(serde_json::json!({
        "running": p.is_running(),
        "capability": p.capability(),
        "memoryTrend": p.memory_trend(),
        "latest": p.latest_measurement(),
        "componentCount": p.components().len(),
        "leakCount": p.leaks().len(),
        "alertCount": p.alerts().len(),
        "suggestionCount": p.suggestions().len(),
        "sampleIntervalMs": p.config().sample_interval_ms,
        "autostart": state.config.server.autostart,
        "broadcastCapacity": state.config.server.broadcast_capacity,
    }))
}

pub(super) async fn start_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let started = state.profiler.start()?;
    Ok(Json(serde_json::json!({ "started": started })))
}

pub(super) async fn stop_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "stopped": state.profiler.stop() }))
}

pub(super) async fn reset_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.profiler.reset();
    StatusCode::NO_CONTENT
}

pub(super) async fn sample_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profiler.sample_now())
}

pub(super) async fn get_config_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profiler.config())
}

pub(super) async fn patch_config_handler(
    State(state): State<AppState>,
    Json(patch): Json<ConfigPatch>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.profiler.update_config(&patch)?))
}

pub(super) async fn timeline_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profiler.timeline())
}

pub(super) async fn record_measurement_handler(
    State(state): State<AppState>,
    Json(measurement): Json<MemoryMeasurement>,
) -> impl IntoResponse {
    Json(state.profiler.record_measurement(measurement))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventBody {
    #[serde(rename = "type")]
    type_: TimelineEventType,
    description: String,
    #[serde(default)]
    memory_impact: Option<i64>,
}

pub(super) async fn record_event_handler(
    State(state): State<AppState>,
    Json(body): Json<EventBody>,
) -> impl IntoResponse {
    state
        .profiler
        .record_event(body.type_, body.description, body.memory_impact);
    StatusCode::NO_CONTENT
}

pub(super) async fn performance_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profiler.performance())
}

pub(super) async fn record_performance_handler(
    State(state): State<AppState>,
    Json(entry): Json<PerformanceEntry>,
) -> impl IntoResponse {
    state.profiler.record_performance_entry(&entry);
    Json(state.profiler.performance())
}

#[derive(Deserialize)]
pub(super) struct TopQuery {
    top: Option<usize>,
}

/// GET /api/components — all components, or the largest N with `?top=N`.
pub(super) async fn components_handler(
    State(state): State<AppState>,
    Query(q): Query<TopQuery>,
) -> impl IntoResponse {
    let components = match q.top {
        Some(n) => state.profiler.top_components(n),
        None => state.profiler.components(),
    };
    Json(serde_json::json!({
        "components": components,
        "hooks": state.profiler.hooks(),
    }))
}

pub(super) async fn leaks_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "leaks": state.profiler.leaks(),
        "leakPatterns": state.profiler.leak_patterns(),
        "gcEvents": state.profiler.gc_events(),
    }))
}

pub(super) async fn violations_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profiler.budget_violations())
}

pub(super) async fn list_snapshots_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profiler.snapshots())
}

#[derive(Deserialize)]
pub(super) struct SnapshotBody {
    #[serde(default)]
    name: String,
}

pub(super) async fn create_snapshot_handler(
    State(state): State<AppState>,
    Json(body): Json<SnapshotBody>,
) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(state.profiler.create_snapshot(&body.name)),
    )
}

pub(super) async fn delete_snapshot_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.profiler.delete_snapshot(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn alerts_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profiler.alerts())
}

pub(super) async fn clear_alerts_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.profiler.clear_alerts();
    StatusCode::NO_CONTENT
}

pub(super) async fn dismiss_alert_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.profiler.dismiss_alert(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub(super) async fn suggestions_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profiler.suggestions())
}

pub(super) async fn dismiss_suggestion_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.profiler.dismiss_suggestion(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET /api/export — full state as one self-describing document.
pub(super) async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profiler.export_document())
}

/// POST /api/import — best-effort merge; the report lists what applied.
pub(super) async fn import_handler(
    State(state): State<AppState>,
    Json(document): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.profiler.import_value(document)?))
}

pub(super) async fn force_gc_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "collected": state.profiler.force_gc() }))
}
