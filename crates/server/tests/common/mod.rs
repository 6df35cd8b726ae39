//! Common test utilities for in-process API testing.
//!
//! The fixture wires the real engine, stores and scheduler against a
//! temporary SQLite file. Time is driven by a manual clock and deadlines are
//! fired with explicit scheduler ticks, so no test waits on a real timer.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use snakedraft_core::{
    config::DatabaseConfig,
    create_event_system,
    events::EventFilter,
    testing::{fixtures, ManualClock},
    Config, DraftEngine, DraftStore, EventStore, SchedulerConfig,
    SqliteDraftStore, SqliteEventStore, TurnScheduler,
};
use snakedraft_server::state::AppState;

/// Test fixture for API testing.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Drives turn deadlines
    pub clock: Arc<ManualClock>,
    /// Not started; call `tick()` to fire due deadlines
    pub scheduler: Arc<TurnScheduler>,
    pub event_store: Arc<dyn EventStore>,
    /// Keeps the database file alive for the fixture's lifetime
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            scheduler: SchedulerConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };

        let draft_store: Arc<dyn DraftStore> =
            Arc::new(SqliteDraftStore::new(&db_path).expect("Failed to create draft store"));
        let event_store: Arc<dyn EventStore> =
            Arc::new(SqliteEventStore::new(&db_path).expect("Failed to create event store"));

        let (event_handle, event_writer) = create_event_system(Arc::clone(&event_store), 100);
        tokio::spawn(event_writer.run());

        let clock = Arc::new(ManualClock::new(fixtures::epoch()));
        let engine = Arc::new(DraftEngine::new(
            draft_store,
            event_handle,
            clock.clone(),
            config.draft.clone(),
        ));
        let scheduler = Arc::new(TurnScheduler::new(
            config.scheduler.clone(),
            Arc::clone(&engine),
        ));

        let state = Arc::new(AppState::new(
            config,
            engine,
            Some(Arc::clone(&scheduler)),
            Arc::clone(&event_store),
        ));

        let router = snakedraft_server::api::create_router(state);

        Self {
            router,
            clock,
            scheduler,
            event_store,
            temp_dir,
        }
    }

    /// Create a draft with a pool of `pool` castaways ("c01", "c02", ...).
    pub async fn create_draft(&self, id: &str, pool: usize) -> TestResponse {
        self.post(
            "/api/v1/drafts",
            serde_json::json!({
                "session_id": id,
                "castaway_ids": fixtures::castaways(pool),
            }),
        )
        .await
    }

    /// Create and start a draft with 30 second turns.
    pub async fn start_draft(
        &self,
        id: &str,
        participants: &[&str],
        roster_size: u32,
        pool: usize,
    ) -> TestResponse {
        let created = self.create_draft(id, pool).await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
        self.post(
            &format!("/api/v1/drafts/{}/start", id),
            serde_json::json!({
                "participants": participants,
                "roster_size": roster_size,
                "turn_duration_secs": fixtures::TURN_SECS,
            }),
        )
        .await
    }

    /// Wait until the event writer has persisted at least `count` events
    /// matching `filter`.
    pub async fn wait_for_events(&self, filter: &EventFilter, count: i64) {
        for _ in 0..100 {
            if self.event_store.count(filter).unwrap_or(0) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {} events", count);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Fetch a path and return the body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
