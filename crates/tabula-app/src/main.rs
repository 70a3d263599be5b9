//! Tabula application binary - composition root.
//!
//! Ties together all Tabula crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Build application state (analyzer, session store, query router,
//!    optional Gemini model)
//! 3. Start the idle-session sweeper as a background task
//! 4. Start the axum REST API server

mod cli;

use std::sync::Arc;

use clap::Parser;

use tabula_api::state::AppState;
use tabula_api::routes;
use tabula_core::config::TabulaConfig;
use tabula_session::SessionStore;

use cli::CliArgs;

/// Periodically drop sessions that have been idle past the configured TTL.
async fn idle_sweep_loop(store: Arc<SessionStore>, ttl_minutes: u64, interval_secs: u64) {
    let max_idle = chrono::Duration::minutes(ttl_minutes as i64);
    tracing::info!(ttl_minutes, interval_secs, "Idle session sweeper started");

    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
    // The first tick fires immediately; skip it so a fresh boot stays quiet.
    interval.tick().await;

    loop {
        interval.tick().await;
        let evicted = store.evict_idle(max_idle);
        if evicted > 0 {
            tracing::debug!(evicted, active = store.len(), "Idle sweep pass complete");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first: the log level may come from it.
    let config_file = args.resolve_config_path();
    let mut config = TabulaConfig::load_or_default(&config_file);
    config.general.port = args.resolve_port(config.general.port);
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Tabula v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let state = AppState::new(config.clone());

    // Idle session sweeper.
    let sweep_store = Arc::clone(&state.store);
    tokio::spawn(idle_sweep_loop(
        sweep_store,
        config.session.idle_ttl_minutes,
        config.session.sweep_interval_secs,
    ));

    // API server (blocks until shutdown).
    routes::start_server(state).await?;

    Ok(())
}
