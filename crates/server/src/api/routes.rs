use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{drafts, events, handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/scheduler", get(handlers::scheduler_status))
        // Event log
        .route("/events", get(events::query_events))
        // Drafts
        .route("/drafts", post(drafts::create_draft).get(drafts::list_drafts))
        .route("/drafts/{id}", get(drafts::get_draft))
        .route("/drafts/{id}/start", post(drafts::start_draft))
        .route(
            "/drafts/{id}/picks",
            post(drafts::submit_pick).get(drafts::get_ledger),
        )
        .route("/drafts/{id}/pause", post(drafts::pause_draft))
        .route("/drafts/{id}/resume", post(drafts::resume_draft))
        .route("/drafts/{id}/abort", post(drafts::abort_draft))
        .route("/drafts/{id}/verify", get(drafts::verify_draft))
        .route(
            "/drafts/{id}/rankings/{participant_id}",
            put(drafts::submit_ranking),
        )
        .with_state(Arc::clone(&state));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
