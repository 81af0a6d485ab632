// HTTP + WebSocket routes: the command surface and the live measurement stream

mod http;
mod ws;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::profiler::Profiler;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) profiler: Profiler,
    pub(crate) config: AppConfig,
}

pub fn app(profiler: Profiler, config: AppConfig) -> Router {
    let state = AppState { profiler, config };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/state", get(http::state_handler)) // GET /api/state
        .route("/api/start", post(http::start_handler)) // POST /api/start
        .route("/api/stop", post(http::stop_handler)) // POST /api/stop
        .route("/api/reset", post(http::reset_handler)) // POST /api/reset
        .route("/api/sample", post(http::sample_handler)) // POST /api/sample
        .route(
            "/api/config",
            get(http::get_config_handler).patch(http::patch_config_handler),
        ) // GET|PATCH /api/config
        .route("/api/timeline", get(http::timeline_handler)) // GET /api/timeline
        .route(
            "/api/measurements",
            post(http::record_measurement_handler),
        ) // POST /api/measurements
        .route("/api/events", post(http::record_event_handler)) // POST /api/events
        .route(
            "/api/performance",
            get(http::performance_handler).post(http::record_performance_handler),
        ) // GET|POST /api/performance
        .route("/api/components", get(http::components_handler)) // GET /api/components?top=N
        .route("/api/leaks", get(http::leaks_handler)) // GET /api/leaks
        .route("/api/violations", get(http::violations_handler)) // GET /api/violations
        .route(
            "/api/snapshots",
            get(http::list_snapshots_handler).post(http::create_snapshot_handler),
        ) // GET|POST /api/snapshots
        .route("/api/snapshots/{id}", delete(http::delete_snapshot_handler)) // DELETE /api/snapshots/{id}
        .route(
            "/api/alerts",
            get(http::alerts_handler).delete(http::clear_alerts_handler),
        ) // GET|DELETE /api/alerts
        .route("/api/alerts/{id}", delete(http::dismiss_alert_handler)) // DELETE /api/alerts/{id}
        .route("/api/suggestions", get(http::suggestions_handler)) // GET /api/suggestions
        .route(
            "/api/suggestions/{id}",
            delete(http::dismiss_suggestion_handler),
        ) // DELETE /api/suggestions/{id}
        .route("/api/export", get(http::export_handler)) // GET /api/export
        .route("/api/import", post(http::import_handler)) // POST /api/import
        .route("/api/gc", post(http::force_gc_handler)) // POST /api/gc
        .route("/ws/memory", get(ws::ws_memory)) // WS /ws/memory
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
