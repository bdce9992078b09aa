//! HTTP/WebSocket API for the Fermi poker server.
//!
//! This module provides the complete REST and WebSocket API for hosting
//! concurrent Fermi poker games. It handles game setup, seat management,
//! in-question play, and real-time state updates.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Actor Model**: Game state owned by dedicated actor tasks behind
//!   [`fermi_poker::GameManager`]
//! - **Sessions**: Opaque per-player tokens minted at join time; views are
//!   redacted for whoever the token resolves to
//!
//! # Modules
//!
//! - [`games`]: Game lifecycle (create, add questions, join, start, read)
//! - [`questions`]: In-question play (guesses, bets, predictions, resolution)
//! - [`players`]: Player lifecycle (rejoin after bankruptcy, leave)
//! - [`websocket`]: Change-feed-driven snapshot push per connection
//! - [`request_id`]: Request ID propagation for log correlation
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                                    - Health check
//! POST /api/v1/games                              - Create game
//! POST /api/v1/games/{game_id}/questions          - Add question
//! POST /api/v1/games/{game_id}/join               - Join game
//! POST /api/v1/games/{game_id}/start              - Start game (host only)
//! GET  /api/v1/games/{game_id}?session=<token>    - Redacted game view
//! POST /api/v1/questions/{question_id}/guess      - Submit range guess
//! POST /api/v1/questions/{question_id}/bets       - Submit bet action
//! POST /api/v1/questions/{question_id}/predictions- Submit winner prediction
//! POST /api/v1/questions/{question_id}/resolve    - Reveal and resolve
//! POST /api/v1/players/{player_id}/rejoin         - Rejoin after bankruptcy
//! POST /api/v1/players/{player_id}/leave          - Leave game
//! GET  /ws/{game_id}?session=<token>              - WebSocket state feed
//! ```
//!
//! # Error Format
//!
//! Engine rejections map onto status codes by their kind: validation and
//! illegal actions are `400`, unknown ids are `404`, duplicate submissions
//! and lost phase races are `409`. Bodies carry both the human-readable
//! message and the machine-readable kind:
//!
//! ```json
//! {"error": "cannot check against an open bet of 25", "kind": "invalid_action"}
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod games;
pub mod players;
pub mod questions;
pub mod request_id;
pub mod websocket;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use fermi_poker::{ErrorKind, GameError, GameManager, table::DEFAULT_TICK};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket
/// connections. Cloned per request; the manager is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<GameManager>,
}

impl AppState {
    /// State backed by a fresh manager with the given game defaults.
    #[must_use]
    pub fn new(settings: fermi_poker::GameSettings) -> Self {
        Self {
            manager: Arc::new(GameManager::new(settings, DEFAULT_TICK)),
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

/// The handler error type: a status code plus the JSON body.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map an engine error onto its HTTP representation.
pub(crate) fn map_game_error(err: GameError) -> ApiError {
    let kind = err.kind();
    let status = match kind {
        ErrorKind::Validation | ErrorKind::InvalidAction => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadySubmitted | ErrorKind::Conflict => StatusCode::CONFLICT,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            kind,
        }),
    )
}

/// Create the complete API router with all endpoints and middleware.
///
/// Constructs an Axum router with the game, question, player, and WebSocket
/// endpoints configured, the request ID middleware, and permissive CORS.
///
/// # Example
///
/// ```rust,no_run
/// # use fp_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let state = AppState::new(fermi_poker::GameSettings::default());
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    // API v1 routes (versioned for future evolution)
    let v1_routes = create_v1_router();

    // Root routes (health check, WebSocket - not versioned)
    let root_routes = Router::new()
        .route("/health", get(health_check))
        // WebSocket route resolves its viewer via query parameter
        .route("/ws/{game_id}", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/games", post(games::create_game))
        .route("/games/{game_id}", get(games::get_game))
        .route("/games/{game_id}/questions", post(games::add_question))
        .route("/games/{game_id}/join", post(games::join_game))
        .route("/games/{game_id}/start", post(games::start_game))
        .route("/questions/{question_id}/guess", post(questions::submit_guess))
        .route("/questions/{question_id}/bets", post(questions::submit_bet))
        .route(
            "/questions/{question_id}/predictions",
            post(questions::submit_prediction),
        )
        .route(
            "/questions/{question_id}/resolve",
            post(questions::resolve_question),
        )
        .route("/players/{player_id}/rejoin", post(players::rejoin_player))
        .route("/players/{player_id}/leave", post(players::leave_game))
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"1.0.0","games":{"active_count":2},"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let game_count = state.manager.game_count().await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "games": {
            "active_count": game_count,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
