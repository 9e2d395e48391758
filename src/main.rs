mod config;
mod errors;
mod feeds;
mod models;
mod server;
mod signals;
mod simulation;
mod state;

use crate::feeds::HistoryFeed;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("options simulator starting");

    // Load config
    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let feed = HistoryFeed::from_config(&cfg);
    let app_state = AppState::new(cfg.clone(), feed);

    // Warm-up run with the configured defaults so the log shows a headline
    // before the first request. Failure here is reported, not fatal.
    let sim = &cfg.simulation;
    match app_state.feed.fetch(&sim.symbol, sim.start_date, sim.end_date).await {
        Ok(series) => {
            if let Err(e) = simulation::run_simulation(&app_state.pricer, sim, &series) {
                tracing::warn!(error = %e, "startup simulation failed");
            }
        }
        Err(e) => tracing::warn!(error = %e, symbol = %sim.symbol, "startup price fetch failed"),
    }

    let app = server::router(app_state);

    let addr = format!("0.0.0.0:{}", cfg.server_port);
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
