use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snakedraft_core::{
    create_event_system, load_config, validate_config, DraftEngine, DraftEvent, DraftStore,
    EventStore, SqliteDraftStore, SqliteEventStore, SystemClock, TurnScheduler,
};
use snakedraft_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SNAKEDRAFT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Compute config hash for the ServiceStarted event
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // Drafts and events share one SQLite file
    let draft_store: Arc<dyn DraftStore> = Arc::new(
        SqliteDraftStore::new(&config.database.path).context("Failed to create draft store")?,
    );
    info!("Draft store initialized");

    let event_store: Arc<dyn EventStore> = Arc::new(
        SqliteEventStore::new(&config.database.path).context("Failed to create event store")?,
    );
    info!("Event store initialized");

    let (event_handle, event_writer) =
        create_event_system(Arc::clone(&event_store), config.events.buffer_size);
    let writer_handle = tokio::spawn(event_writer.run());

    event_handle
        .emit(DraftEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;

    let engine = Arc::new(DraftEngine::new(
        draft_store,
        event_handle.clone(),
        Arc::new(SystemClock),
        config.draft.clone(),
    ));

    // The scheduler reloads in-progress drafts before the API accepts requests
    let scheduler = if config.scheduler.enabled {
        let scheduler = Arc::new(TurnScheduler::new(
            config.scheduler.clone(),
            Arc::clone(&engine),
        ));
        let report = scheduler
            .start()
            .await
            .context("Failed to recover in-progress drafts")?;
        info!(
            sessions = report.sessions,
            seeded = report.seeded,
            inconsistent = report.inconsistent.len(),
            "Turn scheduler started"
        );
        for session_id in &report.inconsistent {
            warn!(session_id = %session_id, "Draft paused: ledger disagrees with stored state");
        }
        Some(scheduler)
    } else {
        info!("Turn scheduler disabled in config; turn deadlines will not fire");
        None
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&engine),
        scheduler.clone(),
        event_store,
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(ref scheduler) = scheduler {
        info!("Stopping turn scheduler...");
        scheduler.stop().await;
        info!("Turn scheduler stopped");
    }

    info!("Server shutting down...");
    event_handle
        .emit(DraftEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // The writer exits once every EventHandle clone is gone. The engine
    // holds one, and so does the scheduler through its engine reference.
    drop(scheduler);
    drop(engine);
    drop(event_handle);

    match writer_handle.await {
        Ok(summary) if summary.dropped > 0 || summary.pick_gaps > 0 => warn!(
            dropped = summary.dropped,
            pick_gaps = summary.pick_gaps,
            "Event writer stopped with an incomplete event log"
        ),
        Ok(_) => info!("Event writer stopped"),
        Err(e) => error!("Event writer task failed: {}", e),
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
