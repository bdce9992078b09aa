//! Game lifecycle API handlers.
//!
//! This module provides HTTP REST endpoints for setting a game up and
//! reading it back:
//! - Creating a game (with or without the meta-game)
//! - Adding questions with hidden answers, antes, and hints
//! - Joining with a display name, minting a session token on first join
//! - Starting the game (host only)
//! - Reading the redacted game view for a session
//!
//! # Examples
//!
//! Create a game:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/games \
//!   -H "Content-Type: application/json" \
//!   -d '{"meta_game_on": true}'
//! ```
//!
//! Join it:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/games/1/join \
//!   -H "Content-Type: application/json" \
//!   -d '{"display_name": "ada"}'
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use fermi_poker::{
    GameView,
    entities::{
        Answer, Chips, DisplayName, Game, GameId, PlayerId, Question, QuestionId, SessionId,
    },
};
use uuid::Uuid;

use super::{ApiError, AppState, map_game_error, players::PlayerResponse};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    /// Whether players may predict each question's winner to earn a
    /// post-bankruptcy rejoin.
    pub meta_game_on: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddQuestionRequest {
    pub question_text: String,
    pub correct_answer: Answer,
    pub ante: Chips,
    pub order_num: u32,
    #[serde(default)]
    pub hints: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinGameRequest {
    /// Omit on first join; the server mints a token and returns it.
    /// Supplying a token you already hold returns your existing seat.
    pub session_id: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct JoinGameResponse {
    /// The caller's identity for every later call. Keep it.
    pub session_id: String,
    #[serde(flatten)]
    pub player: PlayerResponse,
}

#[derive(Debug, Deserialize)]
pub struct StartGameRequest {
    pub player_id: PlayerId,
}

#[derive(Debug, Serialize)]
pub struct StartGameResponse {
    /// The question that just entered its guessing phase.
    pub question_id: QuestionId,
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub session: Option<String>,
}

/// Create a new game.
///
/// # Response
///
/// Returns `200 OK` with the created game:
/// ```json
/// {"id": 1, "status": "waiting_for_players", "meta_game_on": true, "created_at": "..."}
/// ```
pub async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Json<Game> {
    let game = state.manager.create_game(request.meta_game_on).await;
    metrics::games_created_total();
    metrics::active_games(state.manager.game_count().await);
    Json(game)
}

/// Add a question to a game that has not started yet.
///
/// The correct answer stays server-side until the question's final reveal;
/// it is only echoed here, back to the author who supplied it.
///
/// # Errors
///
/// - `400 Bad Request`: empty text, non-positive answer/ante/order, or a
///   duplicate order number; also once the game has started
/// - `404 Not Found`: unknown game
pub async fn add_question(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    Json(request): Json<AddQuestionRequest>,
) -> Result<Json<Question>, ApiError> {
    let question = state
        .manager
        .add_question(
            game_id,
            request.question_text,
            request.correct_answer,
            request.ante,
            request.order_num,
            request.hints,
        )
        .await
        .map_err(map_game_error)?;
    Ok(Json(question))
}

/// Take a seat in a game that has not started yet.
///
/// # Request Body
///
/// ```json
/// {"display_name": "ada", "session_id": null}
/// ```
///
/// # Response
///
/// Returns `200 OK` with the seat and the session token to present on every
/// later call:
/// ```json
/// {"session_id": "5e0c7a...", "id": 3, "game_id": 1, "display_name": "ada",
///  "chips": 100, "status": "active", "correct_preds": 0, "joined_at": "..."}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: game already started, game full, or blank name
/// - `404 Not Found`: unknown game
///
/// # Notes
///
/// Rejoining with a previously returned `session_id` yields the same player,
/// which is how a reconnecting client finds its seat again.
pub async fn join_game(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    Json(request): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, ApiError> {
    let session_id = request
        .session_id
        .map(|token| SessionId::new(&token))
        .filter(|token| !token.is_empty())
        .unwrap_or_else(|| SessionId::new(&Uuid::new_v4().to_string()));

    let player = state
        .manager
        .join_game(
            game_id,
            session_id.clone(),
            DisplayName::new(&request.display_name),
        )
        .await
        .map_err(map_game_error)?;
    metrics::players_joined_total();

    Ok(Json(JoinGameResponse {
        session_id: session_id.to_string(),
        player: player.into(),
    }))
}

/// Start the game, activating its first question.
///
/// Only the first player to have joined (the host) may start, and only once
/// enough players are seated and at least one question exists.
///
/// # Errors
///
/// - `400 Bad Request`: caller is not the host, too few players, no
///   questions, or the game already started
/// - `404 Not Found`: unknown game
pub async fn start_game(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    Json(request): Json<StartGameRequest>,
) -> Result<Json<StartGameResponse>, ApiError> {
    let question_id = state
        .manager
        .start_game(game_id, request.player_id)
        .await
        .map_err(map_game_error)?;
    Ok(Json(StartGameResponse { question_id }))
}

/// Read the game as a given viewer may see it.
///
/// The `session` query parameter resolves the viewer; without it the caller
/// gets the spectator view. Hidden material (the answer before its reveal,
/// other players' open guesses, ungraded predictions) is redacted by the
/// engine, not here.
///
/// # Errors
///
/// - `404 Not Found`: unknown game
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<GameView>, ApiError> {
    let session = query.session.map(|token| SessionId::new(&token));
    let view = state
        .manager
        .game_view(game_id, session)
        .await
        .map_err(map_game_error)?;
    Ok(Json(view))
}
