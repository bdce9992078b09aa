//! Redacted snapshots.
//!
//! Clients never see raw [`GameState`]. A [`GameView`] carries what the
//! viewing player is entitled to: the answer stays hidden until the final
//! reveal, unrevealed hints stay dark, other players' ranges stay private
//! while guessing is open, and session tokens never leave the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    entities::{
        Answer, Bet, Chips, DisplayName, Game, Hint, Player, PlayerGuess, PlayerId, PlayerStanding,
        PlayerStatus, Prediction, QuestionId, QuestionPhase,
    },
    state::{GameState, QuestionState, Resolution},
};

/// Everything one viewer may see of a game.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GameView {
    pub game: Game,
    pub players: Vec<PlayerView>,
    pub question: Option<QuestionView>,
}

/// Roster entry, minus the session token.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub display_name: DisplayName,
    pub chips: Chips,
    pub status: PlayerStatus,
    pub correct_preds: u32,
    pub joined_at: DateTime<Utc>,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            display_name: player.display_name.clone(),
            chips: player.chips,
            status: player.status,
            correct_preds: player.correct_preds,
            joined_at: player.joined_at,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub question_text: String,
    pub ante: Chips,
    pub order_num: u32,
    pub phase: QuestionPhase,
    /// Present from the final reveal on, never before.
    pub correct_answer: Option<Answer>,
    pub guess_deadline: Option<DateTime<Utc>>,
    pub pot_size: Chips,
    /// Highest bet of the open round, 0 outside betting.
    pub highest_bet: Chips,
    pub hints: Vec<Hint>,
    pub guesses: Vec<PlayerGuess>,
    pub bets: Vec<Bet>,
    pub standings: Vec<PlayerStanding>,
    pub predictions: Vec<Prediction>,
    pub resolution: Option<Resolution>,
}

impl QuestionState {
    /// Snapshot of this question as the given viewer may see it. Ranges go
    /// public once betting starts (they are what is being bet on);
    /// predictions stay private until the reveal grades them.
    #[must_use]
    pub fn view_for(&self, viewer: Option<PlayerId>) -> QuestionView {
        let phase = self.phase();
        let revealed = phase == QuestionPhase::FinalReveal;
        let guesses = if phase == QuestionPhase::GuessingPhase {
            self.guesses
                .iter()
                .filter(|g| Some(g.player_id) == viewer)
                .cloned()
                .collect()
        } else {
            self.guesses.clone()
        };
        let predictions = if revealed {
            self.predictions.clone()
        } else {
            self.predictions
                .iter()
                .filter(|p| Some(p.player_id) == viewer)
                .cloned()
                .collect()
        };
        QuestionView {
            id: self.question.id,
            question_text: self.question.question_text.clone(),
            ante: self.question.ante,
            order_num: self.question.order_num,
            phase,
            correct_answer: revealed.then_some(self.question.correct_answer),
            guess_deadline: self.guess_deadline,
            pot_size: self.pot_size(),
            highest_bet: phase
                .betting_round()
                .map_or(0, |round| self.highest_bet(round)),
            hints: self.hints.iter().filter(|h| h.is_revealed()).cloned().collect(),
            guesses,
            bets: self.bets.clone(),
            standings: self.standings.clone(),
            predictions,
            resolution: self.resolution.clone(),
        }
    }
}

impl GameState {
    #[must_use]
    pub fn view_for(&self, viewer: Option<PlayerId>) -> GameView {
        GameView {
            game: self.game.clone(),
            players: self.players.iter().map(PlayerView::from).collect(),
            question: self.current_question().map(|qs| qs.view_for(viewer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        entities::{BetAction, SessionId},
        state::{GameSettings, IdSeq},
    };

    fn started_game() -> (GameState, PlayerId, PlayerId, QuestionId) {
        let mut state = GameState::create(true, GameSettings::default(), IdSeq::new(), Utc::now());
        let a = state
            .join(
                SessionId::new("secret-token-a"),
                DisplayName::new("ada"),
                Utc::now(),
            )
            .unwrap()
            .id;
        let b = state
            .join(
                SessionId::new("secret-token-b"),
                DisplayName::new("bob"),
                Utc::now(),
            )
            .unwrap()
            .id;
        let q = state
            .add_question("how many?", 150, 10, 1, vec!["hint one".to_string()])
            .unwrap()
            .id;
        state.start(a, Utc::now()).unwrap();
        (state, a, b, q)
    }

    // ============================================================================
    // Redaction Tests
    // ============================================================================

    #[test]
    fn test_session_tokens_never_serialize() {
        let (state, _, _, _) = started_game();
        let json = serde_json::to_string(&state.view_for(None)).unwrap();
        assert!(!json.contains("secret-token"));
    }

    #[test]
    fn test_answer_hidden_until_reveal() {
        let (mut state, a, b, q) = started_game();
        let view = state.view_for(Some(a));
        assert_eq!(view.question.unwrap().correct_answer, None);

        state.submit_guess(a, q, 100, 200, true, Utc::now()).unwrap();
        state.submit_guess(b, q, 10, 20, true, Utc::now()).unwrap();
        for round in 1..=3 {
            for p in [a, b] {
                state
                    .submit_bet(p, q, round, BetAction::Check, 0, Utc::now())
                    .unwrap();
            }
        }
        let view = state.view_for(Some(a)).question.unwrap();
        assert_eq!(view.correct_answer, Some(150));
        assert!(view.resolution.is_some());
    }

    #[test]
    fn test_other_ranges_hidden_while_guessing() {
        let (mut state, a, b, q) = started_game();
        state.submit_guess(a, q, 100, 200, false, Utc::now()).unwrap();

        let for_a = state.view_for(Some(a)).question.unwrap();
        assert_eq!(for_a.guesses.len(), 1);
        let for_b = state.view_for(Some(b)).question.unwrap();
        assert!(for_b.guesses.is_empty());
        let spectator = state.view_for(None).question.unwrap();
        assert!(spectator.guesses.is_empty());

        // Once betting opens the ranges are the table stakes.
        state.submit_guess(a, q, 100, 200, true, Utc::now()).unwrap();
        state.submit_guess(b, q, 10, 20, true, Utc::now()).unwrap();
        let for_b = state.view_for(Some(b)).question.unwrap();
        assert_eq!(for_b.guesses.len(), 2);
    }

    #[test]
    fn test_predictions_private_until_graded() {
        let (mut state, a, b, q) = started_game();
        state.submit_prediction(a, q, b, Utc::now()).unwrap();
        let for_b = state.view_for(Some(b)).question.unwrap();
        assert!(for_b.predictions.is_empty());
        let for_a = state.view_for(Some(a)).question.unwrap();
        assert_eq!(for_a.predictions.len(), 1);
    }

    #[test]
    fn test_only_revealed_hints_appear() {
        let (mut state, a, b, q) = started_game();
        assert!(state.view_for(Some(a)).question.unwrap().hints.is_empty());
        state.submit_guess(a, q, 100, 200, true, Utc::now()).unwrap();
        state.submit_guess(b, q, 10, 20, true, Utc::now()).unwrap();
        let hints = state.view_for(Some(a)).question.unwrap().hints;
        assert_eq!(hints.len(), 1);
        assert!(hints[0].is_revealed());
    }

    #[test]
    fn test_view_carries_pot_and_highest() {
        let (mut state, a, b, q) = started_game();
        state.submit_guess(a, q, 100, 200, true, Utc::now()).unwrap();
        state.submit_guess(b, q, 10, 20, true, Utc::now()).unwrap();
        state.submit_bet(a, q, 1, BetAction::Raise, 25, Utc::now()).unwrap();
        let view = state.view_for(Some(b)).question.unwrap();
        assert_eq!(view.pot_size, 45);
        assert_eq!(view.highest_bet, 25);
    }
}
