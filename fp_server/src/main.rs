//! Fermi poker server using the async actor model.
//!
//! Binds a [`fermi_poker::GameManager`] to an HTTP/WebSocket surface: REST
//! endpoints for game setup and play, a per-game WebSocket state feed, and
//! an optional Prometheus exporter.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use ctrlc::set_handler;
use fermi_poker::GameManager;
use fp_server::{api, config::ServerConfig, metrics};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run a Fermi poker game server

USAGE:
  fp_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address   [default: env SERVER_BIND or 127.0.0.1:6969]
  --metrics-bind  IP:PORT  Prometheus scrape address    [default: env METRICS_BIND or disabled]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND               Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND              Prometheus exporter bind address
  GAME_STARTING_CHIPS       Chips a player joins with          [default: 100]
  GAME_GUESS_SECONDS        Guessing phase deadline in seconds [default: 60]
  GAME_REVEAL_HOLD_SECONDS  Reveal display time before advance [default: 15]
  GAME_REENTRY_STAKE        Chips granted on a rejoin          [default: 50]
  GAME_REENTRY_PREDICTIONS  Correct predictions to rejoin      [default: 3]
  GAME_MIN_PLAYERS          Players required to start          [default: 2]
  GAME_MAX_PLAYERS          Seats per game                     [default: 12]
  GAME_TICK_MILLIS          Actor deadline sweep interval      [default: 1000]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let metrics_bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--metrics-bind")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(bind_override, metrics_bind_override)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Prometheus metrics at http://{addr}/metrics");
    }

    info!(
        "Game defaults: {} starting chips, {}s guessing, {} seats",
        config.game.starting_chips, config.game.guess_seconds, config.game.max_players
    );

    let manager = Arc::new(GameManager::new(config.game, config.tick));
    let app = api::create_router(api::AppState { manager });

    info!("Starting Fermi poker server at {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
