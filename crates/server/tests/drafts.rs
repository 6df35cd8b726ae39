//! API tests for the draft lifecycle.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use common::TestFixture;
use snakedraft_core::events::EventFilter;

fn pick(participant: &str, index: u32, castaway: &str) -> serde_json::Value {
    json!({
        "participant_id": participant,
        "expected_pick_index": index,
        "castaway_id": castaway,
    })
}

#[tokio::test]
async fn test_full_draft_over_http() {
    let fixture = TestFixture::new().await;

    let response = fixture.start_draft("d1", &["A", "B", "C"], 2, 8).await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("in_progress"));
    assert_json_path!(response.body, "current_picker", json!("A"));
    assert_json_path!(response.body, "total_picks", json!(6));

    // Snake order: A B C C B A
    let picks = [
        ("A", "c01"),
        ("B", "c02"),
        ("C", "c03"),
        ("C", "c04"),
        ("B", "c05"),
        ("A", "c06"),
    ];
    for (index, (participant, castaway)) in picks.iter().enumerate() {
        let response = fixture
            .post(
                "/api/v1/drafts/d1/picks",
                pick(participant, index as u32, castaway),
            )
            .await;
        assert_status!(response, StatusCode::OK);
    }

    let state = fixture.get("/api/v1/drafts/d1").await;
    assert_status!(state, StatusCode::OK);
    assert_json_path!(state.body, "status", json!("completed"));
    assert_json_path!(state.body, "pick_index", json!(6));
    assert_json_path!(state.body, "version", json!(6));
    assert_json_path!(state.body, "available_castaways", json!(2));
    assert_eq!(state.body["current_deadline"], serde_json::Value::Null);

    let ledger = fixture.get("/api/v1/drafts/d1/picks").await;
    assert_status!(ledger, StatusCode::OK);
    let entries = ledger.body["picks"].as_array().unwrap();
    assert_eq!(entries.len(), 6);
    assert_eq!(entries[3]["participant_id"], "C");
    assert_eq!(entries[3]["castaway_id"], "c04");
    assert_eq!(entries[3]["method"], "manual");

    let verify = fixture.get("/api/v1/drafts/d1/verify").await;
    assert_status!(verify, StatusCode::OK);
    assert_json_path!(verify.body, "consistent", json!(true));
    assert_json_path!(verify.body, "complete", json!(true));
}

#[tokio::test]
async fn test_pick_rejections_map_to_status_codes() {
    let fixture = TestFixture::new().await;
    fixture.start_draft("d1", &["A", "B"], 2, 6).await;

    let wrong_turn = fixture
        .post("/api/v1/drafts/d1/picks", pick("B", 0, "c01"))
        .await;
    assert_status!(wrong_turn, StatusCode::BAD_REQUEST);
    assert_json_path!(wrong_turn.body, "kind", json!("wrong_turn"));

    let unknown = fixture
        .post("/api/v1/drafts/d1/picks", pick("A", 0, "zz"))
        .await;
    assert_status!(unknown, StatusCode::BAD_REQUEST);
    assert_json_path!(unknown.body, "kind", json!("unknown_castaway"));

    let ok = fixture
        .post("/api/v1/drafts/d1/picks", pick("A", 0, "c01"))
        .await;
    assert_status!(ok, StatusCode::OK);

    let stale = fixture
        .post("/api/v1/drafts/d1/picks", pick("A", 0, "c02"))
        .await;
    assert_status!(stale, StatusCode::CONFLICT);
    assert_json_path!(stale.body, "kind", json!("stale_version"));

    let taken = fixture
        .post("/api/v1/drafts/d1/picks", pick("B", 1, "c01"))
        .await;
    assert_status!(taken, StatusCode::BAD_REQUEST);
    assert_json_path!(taken.body, "kind", json!("castaway_unavailable"));

    let outsider = fixture
        .post("/api/v1/drafts/d1/picks", pick("Z", 1, "c02"))
        .await;
    assert_status!(outsider, StatusCode::BAD_REQUEST);
    assert_json_path!(outsider.body, "kind", json!("invalid_participant"));

    // None of the rejections moved the draft
    let state = fixture.get("/api/v1/drafts/d1").await;
    assert_json_path!(state.body, "pick_index", json!(1));
    assert_json_path!(state.body, "version", json!(1));
}

#[tokio::test]
async fn test_expired_turn_is_auto_picked_from_ranking() {
    let fixture = TestFixture::new().await;
    fixture.start_draft("d1", &["A", "B"], 1, 5).await;

    let ranking = fixture
        .put(
            "/api/v1/drafts/d1/rankings/A",
            json!({ "castaway_ids": ["c04", "c02"] }),
        )
        .await;
    assert_status!(ranking, StatusCode::OK);
    assert_json_path!(ranking.body, "participant_id", json!("A"));

    let status = fixture.get("/api/v1/scheduler").await;
    assert_status!(status, StatusCode::OK);
    assert_json_path!(status.body, "running", json!(false));
    assert_json_path!(status.body, "pending_deadlines", json!(1));

    fixture.clock.advance(Duration::seconds(31));
    let report = fixture.scheduler.tick().await;
    assert_eq!(report.auto_picked, 1);

    let ledger = fixture.get("/api/v1/drafts/d1/picks").await;
    let entries = ledger.body["picks"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["participant_id"], "A");
    assert_eq!(entries[0]["castaway_id"], "c04");
    assert_eq!(entries[0]["method"], "auto");

    let state = fixture.get("/api/v1/drafts/d1").await;
    assert_json_path!(state.body, "current_picker", json!("B"));
}

#[tokio::test]
async fn test_ranking_with_unknown_castaway_is_rejected() {
    let fixture = TestFixture::new().await;
    fixture.start_draft("d1", &["A", "B"], 1, 4).await;

    let response = fixture
        .put(
            "/api/v1/drafts/d1/rankings/A",
            json!({ "castaway_ids": ["c01", "nope"] }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lifecycle_transitions() {
    let fixture = TestFixture::new().await;

    let created = fixture.create_draft("d1", 6).await;
    assert_status!(created, StatusCode::CREATED);
    assert_json_path!(created.body, "status", json!("not_started"));

    // Cannot pause a draft that never started
    let pause = fixture.post_empty("/api/v1/drafts/d1/pause").await;
    assert_status!(pause, StatusCode::CONFLICT);
    assert_json_path!(pause.body, "kind", json!("invalid_transition"));

    let start_body = json!({ "participants": ["A", "B"], "roster_size": 2 });
    let started = fixture.post("/api/v1/drafts/d1/start", start_body.clone()).await;
    assert_status!(started, StatusCode::OK);
    assert_json_path!(started.body, "turn_duration_secs", json!(60));

    let again = fixture.post("/api/v1/drafts/d1/start", start_body).await;
    assert_status!(again, StatusCode::CONFLICT);
    assert_json_path!(again.body, "kind", json!("already_started"));

    let paused = fixture.post_empty("/api/v1/drafts/d1/pause").await;
    assert_status!(paused, StatusCode::OK);
    assert_json_path!(paused.body, "status", json!("paused"));
    assert_eq!(paused.body["current_deadline"], serde_json::Value::Null);

    let while_paused = fixture
        .post("/api/v1/drafts/d1/picks", pick("A", 0, "c01"))
        .await;
    assert_status!(while_paused, StatusCode::BAD_REQUEST);
    assert_json_path!(while_paused.body, "kind", json!("draft_not_active"));

    let resumed = fixture.post_empty("/api/v1/drafts/d1/resume").await;
    assert_status!(resumed, StatusCode::OK);
    assert_json_path!(resumed.body, "status", json!("in_progress"));

    let aborted = fixture.post_empty("/api/v1/drafts/d1/abort").await;
    assert_status!(aborted, StatusCode::OK);
    assert_json_path!(aborted.body, "status", json!("aborted"));

    let resume_aborted = fixture.post_empty("/api/v1/drafts/d1/resume").await;
    assert_status!(resume_aborted, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_start_validation() {
    let fixture = TestFixture::new().await;
    fixture.create_draft("d1", 3).await;

    // 2 x 2 picks need 4 castaways
    let too_small = fixture
        .post(
            "/api/v1/drafts/d1/start",
            json!({ "participants": ["A", "B"], "roster_size": 2 }),
        )
        .await;
    assert_status!(too_small, StatusCode::BAD_REQUEST);
    assert_json_path!(too_small.body, "kind", json!("invalid_configuration"));

    let duplicate = fixture
        .post(
            "/api/v1/drafts/d1/start",
            json!({ "participants": ["A", "A"], "roster_size": 1 }),
        )
        .await;
    assert_status!(duplicate, StatusCode::BAD_REQUEST);

    let empty = fixture
        .post(
            "/api/v1/drafts/d1/start",
            json!({ "participants": [], "roster_size": 1 }),
        )
        .await;
    assert_status!(empty, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_draft_returns_404() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/drafts/missing").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_json_path!(response.body, "kind", json!("session_not_found"));

    let response = fixture
        .post("/api/v1/drafts/missing/picks", pick("A", 0, "c01"))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_session_id_is_rejected() {
    let fixture = TestFixture::new().await;
    assert_status!(fixture.create_draft("d1", 4).await, StatusCode::CREATED);
    assert_status!(fixture.create_draft("d1", 4).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_without_id_generates_one() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post("/api/v1/drafts", json!({ "castaway_ids": ["x", "y"] }))
        .await;
    assert_status!(response, StatusCode::CREATED);
    let id = response.body["session_id"].as_str().unwrap();
    assert!(!id.is_empty());

    let fetched = fixture.get(&format!("/api/v1/drafts/{}", id)).await;
    assert_status!(fetched, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let fixture = TestFixture::new().await;
    let response = fixture.post_raw("/api/v1/drafts", "{not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_drafts_with_status_filter() {
    let fixture = TestFixture::new().await;
    fixture.create_draft("waiting", 4).await;
    fixture.start_draft("running", &["A", "B"], 1, 4).await;

    let all = fixture.get("/api/v1/drafts").await;
    assert_status!(all, StatusCode::OK);
    assert_json_path!(all.body, "total", json!(2));

    let running = fixture.get("/api/v1/drafts?status=in_progress").await;
    assert_status!(running, StatusCode::OK);
    assert_json_path!(running.body, "total", json!(1));
    assert_eq!(running.body["drafts"][0]["id"], "running");

    let limited = fixture.get("/api/v1/drafts?limit=1").await;
    assert_eq!(limited.body["drafts"].as_array().unwrap().len(), 1);
    assert_json_path!(limited.body, "limit", json!(1));

    let bad = fixture.get("/api/v1/drafts?status=bogus").await;
    assert_status!(bad, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_events_are_queryable() {
    let fixture = TestFixture::new().await;
    fixture.start_draft("d1", &["A", "B"], 1, 4).await;
    fixture
        .post("/api/v1/drafts/d1/picks", pick("B", 0, "c01"))
        .await;
    fixture
        .post("/api/v1/drafts/d1/picks", pick("A", 0, "c01"))
        .await;

    fixture
        .wait_for_events(
            &EventFilter::new()
                .with_session_id("d1")
                .with_event_type("pick_made"),
            1,
        )
        .await;
    fixture
        .wait_for_events(
            &EventFilter::new()
                .with_session_id("d1")
                .with_event_type("pick_rejected"),
            1,
        )
        .await;

    let made = fixture
        .get("/api/v1/events?session_id=d1&event_type=pick_made")
        .await;
    assert_status!(made, StatusCode::OK);
    assert_json_path!(made.body, "total", json!(1));
    assert_eq!(made.body["events"][0]["participant_id"], "A");

    let rejected = fixture
        .get("/api/v1/events?session_id=d1&event_type=pick_rejected")
        .await;
    assert_json_path!(rejected.body, "total", json!(1));
    assert_eq!(rejected.body["events"][0]["data"]["reason"], "wrong_turn");

    let by_participant = fixture
        .get("/api/v1/events?session_id=d1&participant_id=B")
        .await;
    assert_status!(by_participant, StatusCode::OK);
    assert!(by_participant.body["total"].as_i64().unwrap() >= 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.start_draft("d1", &["A", "B"], 1, 4).await;
    fixture.get("/api/v1/drafts/d1").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("snakedraft_http_requests_total"));
    assert!(body.contains("snakedraft_drafts_by_status"));
    assert!(body.contains("path=\"/api/v1/drafts/{id}\""));
}

#[tokio::test]
async fn test_health_and_config() {
    let fixture = TestFixture::new().await;

    let health = fixture.get("/api/v1/health").await;
    assert_status!(health, StatusCode::OK);
    assert_json_path!(health.body, "status", json!("ok"));

    let config = fixture.get("/api/v1/config").await;
    assert_status!(config, StatusCode::OK);
    assert_json_path!(config.body["draft"], "default_turn_duration_secs", json!(60));
    assert_json_path!(config.body["scheduler"], "enabled", json!(false));
}
