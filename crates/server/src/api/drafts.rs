//! Draft API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use snakedraft_core::{
    draft::{ParticipantRanking, PersistenceError, ValidationError},
    CreateDraftRequest, DraftError, DraftFilter, DraftPick, DraftSession, DraftSnapshot,
    DraftStatus, PickRequest, StartDraftRequest,
};

use crate::state::AppState;

/// Maximum allowed limit for draft listings
const MAX_LIMIT: i64 = 1000;

/// Default limit for draft listings
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing drafts
#[derive(Debug, Deserialize)]
pub struct ListDraftsParams {
    /// Filter by status (e.g. "in_progress")
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response for listing drafts
#[derive(Debug, Serialize)]
pub struct ListDraftsResponse {
    pub drafts: Vec<DraftSession>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Request body for submitting a ranking
#[derive(Debug, Deserialize)]
pub struct RankingBody {
    /// Castaways in preference order, most wanted first
    pub castaway_ids: Vec<String>,
}

/// Response for the ledger endpoint
#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub session_id: String,
    pub picks: Vec<DraftPick>,
}

/// Result of replaying a draft's ledger
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub session_id: String,
    pub consistent: bool,
    pub pick_index: Option<u32>,
    pub complete: Option<bool>,
    pub available_castaways: Option<usize>,
    /// Why the ledger disagrees with stored state
    pub detail: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct DraftErrorResponse {
    pub error: String,
    /// Machine-readable error kind
    pub kind: String,
}

type ApiError = (StatusCode, Json<DraftErrorResponse>);

fn draft_error(err: DraftError) -> ApiError {
    let status = match &err {
        DraftError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        DraftError::Validation(ValidationError::AlreadyStarted { .. })
        | DraftError::Validation(ValidationError::InvalidTransition { .. }) => StatusCode::CONFLICT,
        DraftError::Validation(_) => StatusCode::BAD_REQUEST,
        DraftError::Concurrency(_) => StatusCode::CONFLICT,
        DraftError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DraftError::Scheduler(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(DraftErrorResponse {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }),
    )
}

fn bad_request(error: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(DraftErrorResponse {
            error,
            kind: "bad_request".to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a draft and its castaway pool
pub async fn create_draft(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateDraftRequest>,
) -> Result<(StatusCode, Json<DraftSnapshot>), ApiError> {
    let snapshot = state.engine().create_draft(body).await.map_err(draft_error)?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// List drafts with optional status filter
pub async fn list_drafts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListDraftsParams>,
) -> Result<Json<ListDraftsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let status = match params.status.as_deref() {
        Some(s) => Some(
            DraftStatus::parse(s).ok_or_else(|| bad_request(format!("Unknown status: {}", s)))?,
        ),
        None => None,
    };

    let mut filter = DraftFilter::new().with_limit(limit).with_offset(offset);
    if let Some(status) = status {
        filter = filter.with_status(status);
    }

    let drafts = state.engine().list_drafts(&filter).map_err(draft_error)?;
    let total = state.engine().count_drafts(status).map_err(draft_error)?;

    Ok(Json(ListDraftsResponse {
        drafts,
        total,
        limit,
        offset,
    }))
}

/// Current state of a draft
pub async fn get_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DraftSnapshot>, ApiError> {
    state.engine().get_state(&id).map(Json).map_err(draft_error)
}

/// Fix participants and open the first turn
pub async fn start_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StartDraftRequest>,
) -> Result<Json<DraftSnapshot>, ApiError> {
    state
        .engine()
        .start_draft(&id, body)
        .await
        .map(Json)
        .map_err(draft_error)
}

/// Submit a manual pick
pub async fn submit_pick(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<PickRequest>,
) -> Result<Json<DraftSnapshot>, ApiError> {
    state
        .engine()
        .submit_pick(&id, body)
        .await
        .map(Json)
        .map_err(draft_error)
}

/// Committed picks in order
pub async fn get_ledger(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LedgerResponse>, ApiError> {
    let picks = state.engine().ledger(&id).map_err(draft_error)?;
    Ok(Json(LedgerResponse {
        session_id: id,
        picks,
    }))
}

pub async fn pause_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DraftSnapshot>, ApiError> {
    state
        .engine()
        .pause_draft(&id)
        .await
        .map(Json)
        .map_err(draft_error)
}

pub async fn resume_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DraftSnapshot>, ApiError> {
    state
        .engine()
        .resume_draft(&id)
        .await
        .map(Json)
        .map_err(draft_error)
}

pub async fn abort_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DraftSnapshot>, ApiError> {
    state
        .engine()
        .abort_draft(&id)
        .await
        .map(Json)
        .map_err(draft_error)
}

/// Store a participant's auto-pick preferences
pub async fn submit_ranking(
    State(state): State<Arc<AppState>>,
    Path((id, participant_id)): Path<(String, String)>,
    Json(body): Json<RankingBody>,
) -> Result<Json<ParticipantRanking>, ApiError> {
    state
        .engine()
        .submit_ranking(&id, &participant_id, body.castaway_ids)
        .await
        .map(Json)
        .map_err(draft_error)
}

/// Replay the ledger and compare it with stored state
pub async fn verify_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    match state.engine().verify_ledger(&id) {
        Ok(replayed) => Ok(Json(VerifyResponse {
            session_id: id,
            consistent: true,
            pick_index: Some(replayed.pick_index),
            complete: Some(replayed.complete),
            available_castaways: Some(replayed.available.len()),
            detail: None,
        })),
        Err(DraftError::Persistence(PersistenceError::LedgerMismatch { detail, .. })) => {
            Ok(Json(VerifyResponse {
                session_id: id,
                consistent: false,
                pick_index: None,
                complete: None,
                available_castaways: None,
                detail: Some(detail),
            }))
        }
        Err(e) => Err(draft_error(e)),
    }
}
