//! In-question play API handlers.
//!
//! Everything that happens inside one question routes through here: range
//! guesses during the guessing phase, check/call/raise/fold during the
//! betting rounds, winner predictions while the meta-game is open, and the
//! reveal-and-resolve call. The game manager maps each question id back to
//! its owning game actor, so callers never name the game.
//!
//! # Examples
//!
//! Submit a final guess:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/questions/2/guess \
//!   -H "Content-Type: application/json" \
//!   -d '{"player_id": 3, "lower_bound": 200, "upper_bound": 400, "final": true}'
//! ```
//!
//! Raise to 25 in round 1:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/questions/2/bets \
//!   -H "Content-Type: application/json" \
//!   -d '{"player_id": 3, "round_number": 1, "action": "raise", "amount": 25}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use fermi_poker::{
    Resolution,
    entities::{Answer, Bet, BetAction, Chips, PlayerGuess, PlayerId, Prediction, QuestionId},
};

use super::{ApiError, AppState, map_game_error};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct SubmitGuessRequest {
    pub player_id: PlayerId,
    pub lower_bound: Answer,
    pub upper_bound: Answer,
    /// A final guess locks in; omitted means a revisable draft.
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubmitBetRequest {
    pub player_id: PlayerId,
    /// Must name the betting round that is actually open (1..=3).
    pub round_number: u8,
    pub action: BetAction,
    /// Only raises carry an amount; checks and folds leave it at 0 and the
    /// engine fills in the amount of a call itself.
    #[serde(default)]
    pub amount: Chips,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPredictionRequest {
    pub player_id: PlayerId,
    pub predicted_winner_id: PlayerId,
}

/// Submit or revise a range guess for the open guessing phase.
///
/// # Errors
///
/// - `400 Bad Request`: bounds out of order, guessing phase not open, or
///   the player is not eligible for this question
/// - `404 Not Found`: unknown question or player
/// - `409 Conflict`: a final guess was already locked in
pub async fn submit_guess(
    State(state): State<AppState>,
    Path(question_id): Path<QuestionId>,
    Json(request): Json<SubmitGuessRequest>,
) -> Result<Json<PlayerGuess>, ApiError> {
    let guess = state
        .manager
        .submit_guess(
            request.player_id,
            question_id,
            request.lower_bound,
            request.upper_bound,
            request.is_final,
        )
        .await
        .map_err(map_game_error)?;
    metrics::guesses_submitted_total();
    Ok(Json(guess))
}

/// Submit a bet action for the open betting round.
///
/// # Request Body
///
/// ```json
/// {"player_id": 3, "round_number": 1, "action": "call", "amount": 0}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: wrong round number, check against an open bet,
///   call with nothing to call, raise below the highest bet, insufficient
///   chips, or the player folded/busted out of this question
/// - `404 Not Found`: unknown question or player
/// - `409 Conflict`: the phase advanced mid-flight; re-read and retry
pub async fn submit_bet(
    State(state): State<AppState>,
    Path(question_id): Path<QuestionId>,
    Json(request): Json<SubmitBetRequest>,
) -> Result<Json<Bet>, ApiError> {
    let bet = state
        .manager
        .submit_bet(
            request.player_id,
            question_id,
            request.round_number,
            request.action,
            request.amount,
        )
        .await
        .map_err(map_game_error)?;
    metrics::bets_placed_total(&bet.action.to_string());
    Ok(Json(bet))
}

/// Predict which player will win this question (meta-game only).
///
/// Predictions are accepted during the guessing phase, never name yourself,
/// and are graded at resolution; three correct ones unlock a rejoin after
/// bankruptcy.
///
/// # Errors
///
/// - `400 Bad Request`: meta-game off, self-prediction, inactive target, or
///   the guessing phase is over
/// - `404 Not Found`: unknown question or player
/// - `409 Conflict`: already predicted for this question
pub async fn submit_prediction(
    State(state): State<AppState>,
    Path(question_id): Path<QuestionId>,
    Json(request): Json<SubmitPredictionRequest>,
) -> Result<Json<Prediction>, ApiError> {
    let prediction = state
        .manager
        .submit_prediction(request.player_id, question_id, request.predicted_winner_id)
        .await
        .map_err(map_game_error)?;
    metrics::predictions_submitted_total();
    Ok(Json(prediction))
}

/// Reveal the answer and settle the pot.
///
/// The scheduler calls this itself when betting round 3 completes; invoking
/// it manually during an earlier betting round force-advances the question
/// to its reveal. The operation is idempotent - calling it again returns
/// the recorded outcome without moving any chips.
///
/// # Response
///
/// ```json
/// {"winners": [3], "payouts": [{"player_id": 3, "amount": 60}],
///  "pot_size": 60, "win_amount": 60, "correct_answer": 290, "resolved_at": "..."}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: question still in its guessing phase or not started
/// - `404 Not Found`: unknown question
/// - `409 Conflict`: the phase moved concurrently; re-read and retry
pub async fn resolve_question(
    State(state): State<AppState>,
    Path(question_id): Path<QuestionId>,
) -> Result<Json<Resolution>, ApiError> {
    let resolution = state
        .manager
        .resolve_question(question_id)
        .await
        .map_err(map_game_error)?;
    metrics::questions_resolved_total();
    metrics::pot_size_chips(resolution.pot_size);
    Ok(Json(resolution))
}
