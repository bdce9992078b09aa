//! Player lifecycle API handlers.
//!
//! Covers the two things a player does outside of a question: rejoining
//! after going bankrupt (meta-game reward) and leaving a game for good.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use fermi_poker::entities::{Chips, GameId, Player, PlayerId, PlayerStatus};

use super::{ApiError, AppState, map_game_error};

/// Wire shape of a player. The engine-side [`Player`] carries the session
/// token; this never does.
#[derive(Debug, Serialize)]
pub struct PlayerResponse {
    pub id: PlayerId,
    pub game_id: GameId,
    pub display_name: String,
    pub chips: Chips,
    pub status: PlayerStatus,
    pub correct_preds: u32,
    pub joined_at: DateTime<Utc>,
}

impl From<Player> for PlayerResponse {
    fn from(player: Player) -> Self {
        Self {
            id: player.id,
            game_id: player.game_id,
            display_name: player.display_name.to_string(),
            chips: player.chips,
            status: player.status,
            correct_preds: player.correct_preds,
            joined_at: player.joined_at,
        }
    }
}

/// Buy a bankrupt player back into the game.
///
/// Requires the meta-game and enough correct winner predictions; the player
/// returns with the configured re-entry stake and sits out until the next
/// question's ante.
///
/// # Errors
///
/// - `400 Bad Request`: player not bankrupt, too few correct predictions,
///   or the meta-game is off
/// - `404 Not Found`: unknown player
pub async fn rejoin_player(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let player = state
        .manager
        .rejoin_player(player_id)
        .await
        .map_err(map_game_error)?;
    Ok(Json(player.into()))
}

/// Leave the game.
///
/// Folds the player out of the open question (chips already bet stay in the
/// pot) and excludes them from every later ante. Idempotent for players who
/// already left.
///
/// # Errors
///
/// - `404 Not Found`: unknown player
pub async fn leave_game(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let player = state
        .manager
        .leave_game(player_id)
        .await
        .map_err(map_game_error)?;
    Ok(Json(player.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fermi_poker::entities::{DisplayName, SessionId};

    // ============================================================================
    // Redaction Tests
    // ============================================================================

    #[test]
    fn test_player_response_drops_session_token() {
        let player = Player::new(
            7,
            1,
            SessionId::new("secret-token"),
            DisplayName::new("enrico"),
            100,
            Utc::now(),
        );
        let response: PlayerResponse = player.into();
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("secret-token"));
        assert!(json.contains("enrico"));
    }
}
