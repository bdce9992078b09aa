//! Prometheus metrics for monitoring the Fermi poker server.
//!
//! Metrics are exported in Prometheus text format on the optional
//! `METRICS_BIND` scrape endpoint. Everything here is a thin wrapper so
//! handlers record observations in one line.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts by method, path, and status
//! - **Game Metrics**: Games created, players joined, bets, resolutions,
//!   pot sizes, active game count
//! - **WebSocket Metrics**: Active connections and connection totals

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Sets up a scrape endpoint on the specified address. Metrics will be
/// available at `http://<addr>/metrics`.
///
/// # Errors
///
/// Returns an error message if the exporter cannot be installed (for
/// example when the address is already bound).
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record an HTTP request with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Increment games created counter.
pub fn games_created_total() {
    metrics::counter!("games_created_total").increment(1);
}

/// Set current active games count.
pub fn active_games(count: usize) {
    metrics::gauge!("active_games").set(count as f64);
}

/// Increment players joined counter.
pub fn players_joined_total() {
    metrics::counter!("players_joined_total").increment(1);
}

/// Increment bets placed counter, labelled by action.
pub fn bets_placed_total(action: &str) {
    metrics::counter!("bets_placed_total",
        "action" => action.to_string()
    )
    .increment(1);
}

/// Increment guesses submitted counter.
pub fn guesses_submitted_total() {
    metrics::counter!("guesses_submitted_total").increment(1);
}

/// Increment predictions submitted counter.
pub fn predictions_submitted_total() {
    metrics::counter!("predictions_submitted_total").increment(1);
}

/// Increment questions resolved counter.
pub fn questions_resolved_total() {
    metrics::counter!("questions_resolved_total").increment(1);
}

/// Record pot size distribution at resolution.
pub fn pot_size_chips(size: u32) {
    metrics::histogram!("pot_size_chips").record(f64::from(size));
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Record a WebSocket connection opening.
pub fn websocket_connection_opened() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// Record a WebSocket connection closing.
pub fn websocket_connection_closed() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}
