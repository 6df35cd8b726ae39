//! Event log query handler.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snakedraft_core::events::{EventFilter, EventRecord};

use crate::state::AppState;

/// Maximum allowed limit for event queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for event queries
const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for the events endpoint
#[derive(Debug, Deserialize)]
pub struct EventQueryParams {
    pub session_id: Option<String>,
    /// e.g. "pick_made", "turn_timed_out"
    pub event_type: Option<String>,
    pub participant_id: Option<String>,
    /// Filter events after this timestamp (ISO 8601)
    pub from: Option<DateTime<Utc>>,
    /// Filter events before this timestamp (ISO 8601)
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response for the events endpoint
#[derive(Debug, Serialize)]
pub struct EventQueryResponse {
    /// Newest first
    pub events: Vec<EventRecord>,
    /// Total number of matching events
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct EventErrorResponse {
    pub error: String,
}

/// Query persisted draft events
pub async fn query_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventQueryParams>,
) -> Result<Json<EventQueryResponse>, (StatusCode, Json<EventErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    // Shared between query and count
    let mut base_filter = EventFilter::new();

    if let Some(ref session_id) = params.session_id {
        base_filter = base_filter.with_session_id(session_id);
    }

    if let Some(ref event_type) = params.event_type {
        base_filter = base_filter.with_event_type(event_type);
    }

    if let Some(ref participant_id) = params.participant_id {
        base_filter = base_filter.with_participant_id(participant_id);
    }

    if params.from.is_some() || params.to.is_some() {
        base_filter = base_filter.with_time_range(params.from, params.to);
    }

    let query_filter = EventFilter {
        limit,
        offset,
        ..base_filter.clone()
    };

    let events = state.event_store().query(&query_filter).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(EventErrorResponse {
                error: format!("Failed to query events: {}", e),
            }),
        )
    })?;

    let total = state.event_store().count(&base_filter).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(EventErrorResponse {
                error: format!("Failed to count events: {}", e),
            }),
        )
    })?;

    Ok(Json(EventQueryResponse {
        events,
        total,
        limit,
        offset,
    }))
}
