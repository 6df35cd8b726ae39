use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config with its database inside `dir`
fn minimal_config(port: u16, dir: &Path) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"
"#,
        port,
        dir.join("snakedraft.db").display()
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_snakedraft"))
        .env("SNAKEDRAFT_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

async fn run_to_exit(config_path: &Path) -> std::process::Output {
    timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_snakedraft"))
            .env("SNAKEDRAFT_CONFIG", config_path)
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command")
}

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, dir.path()));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_reflects_file() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let content = format!(
        "{}\n[draft]\ndefault_turn_duration_secs = 45\n",
        minimal_config(port, dir.path())
    );
    let config = write_config(&content);

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let json: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["draft"]["default_turn_duration_secs"], 45);

    let scheduler: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/scheduler", port))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(scheduler["running"], true);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_drafts_survive_restart() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, dir.path()));
    let client = Client::new();
    let base = format!("http://127.0.0.1:{}/api/v1", port);

    let mut server = spawn_server(config.path()).await;
    assert!(wait_for_server(port, 40).await, "Server did not start in time");

    let created = client
        .post(format!("{}/drafts", base))
        .json(&serde_json::json!({ "session_id": "d1", "castaway_ids": ["a", "b", "c", "d"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let started = client
        .post(format!("{}/drafts/d1/start", base))
        .json(&serde_json::json!({ "participants": ["A", "B"], "roster_size": 2 }))
        .send()
        .await
        .unwrap();
    assert!(started.status().is_success());
    let picked = client
        .post(format!("{}/drafts/d1/picks", base))
        .json(&serde_json::json!({
            "participant_id": "A",
            "expected_pick_index": 0,
            "castaway_id": "b",
        }))
        .send()
        .await
        .unwrap();
    assert!(picked.status().is_success());

    server.kill().await.ok();
    let _ = server.wait().await;

    let mut server = spawn_server(config.path()).await;
    assert!(wait_for_server(port, 40).await, "Server did not restart in time");

    let state: serde_json::Value = client
        .get(format!("{}/drafts/d1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["status"], "in_progress");
    assert_eq!(state["pick_index"], 1);
    assert_eq!(state["current_picker"], "B");

    let verify: serde_json::Value = client
        .get(format!("{}/drafts/d1/verify", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(verify["consistent"], true);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = run_to_exit(Path::new("/nonexistent/config.toml")).await;
    assert!(!result.status.success());
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(0, dir.path()));
    let result = run_to_exit(config.path()).await;
    assert!(!result.status.success());
}

#[tokio::test]
async fn test_turn_shorter_than_minimum_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let content = format!(
        "{}\n[draft]\ndefault_turn_duration_secs = 5\nmin_turn_duration_secs = 10\n",
        minimal_config(get_available_port(), dir.path())
    );
    let config = write_config(&content);
    let result = run_to_exit(config.path()).await;
    assert!(!result.status.success());
}
