//! Guesses and pot resolution.
//!
//! During the guessing phase players commit a numeric range they believe
//! contains the answer. At the final reveal the pot goes to the narrowest
//! range containing the answer; if nobody trapped it, to the range whose
//! midpoint lands closest. Resolution runs exactly once per question and is
//! idempotent, so a retried call only re-reads the recorded outcome.

use chrono::{DateTime, Utc};

use super::{
    entities::{Answer, PlayerGuess, PlayerId, PlayerStatus, QuestionId, QuestionPhase, Standing},
    errors::{GameError, GameResult},
    events::{Change, EntityKind},
    state::{GameState, Payout, Resolution},
};

impl GameState {
    /// Submit or revise a guess for the open question. A guess with
    /// `is_final` set locks the range for good; until then resubmission
    /// overwrites. Busted players still guess (their ante is in the pot).
    pub fn submit_guess(
        &mut self,
        player_id: PlayerId,
        question_id: QuestionId,
        lower_bound: Answer,
        upper_bound: Answer,
        is_final: bool,
        now: DateTime<Utc>,
    ) -> GameResult<PlayerGuess> {
        self.sweep(now);
        let qi = self.question_index(question_id)?;
        let pi = self.player_index(player_id)?;
        if !self.players[pi].is_active() {
            return Err(GameError::PlayerNotActive);
        }
        let phase = self.questions[qi].phase();
        if phase != QuestionPhase::GuessingPhase {
            return Err(GameError::WrongPhase { phase });
        }
        match self.questions[qi].standing_of(player_id) {
            None => return Err(GameError::NotInQuestion),
            Some(Standing::FoldedForQuestion) => return Err(GameError::FoldedOut),
            Some(Standing::ActiveForQuestion | Standing::BustedThisQuestion) => {}
        }
        if lower_bound >= upper_bound {
            return Err(GameError::InvalidBounds);
        }

        let guess = match self
            .questions[qi]
            .guesses
            .iter()
            .position(|g| g.player_id == player_id)
        {
            Some(gi) => {
                if self.questions[qi].guesses[gi].is_final {
                    return Err(GameError::GuessAlreadyFinal);
                }
                let row = &mut self.questions[qi].guesses[gi];
                row.lower_bound = lower_bound;
                row.upper_bound = upper_bound;
                row.is_final = is_final;
                row.submitted_at = now;
                let guess = row.clone();
                self.push_change(Change::updated(EntityKind::Guess, player_id));
                guess
            }
            None => {
                let guess = PlayerGuess {
                    player_id,
                    question_id,
                    lower_bound,
                    upper_bound,
                    is_final,
                    submitted_at: now,
                };
                self.questions[qi].guesses.push(guess.clone());
                self.push_change(Change::inserted(EntityKind::Guess, player_id));
                guess
            }
        };
        // Locking the last outstanding guess ends the phase early.
        self.sweep(now);
        Ok(guess)
    }

    /// Reveal the answer and settle the pot. Legal from any betting round
    /// (the question force-advances through the remaining rounds) or at the
    /// final reveal, where it returns the recorded outcome.
    pub fn resolve_question(
        &mut self,
        question_id: QuestionId,
        now: DateTime<Utc>,
    ) -> GameResult<Resolution> {
        self.sweep(now);
        let qi = self.question_index(question_id)?;
        let phase = self.questions[qi].phase();
        match phase {
            QuestionPhase::NotStarted | QuestionPhase::GuessingPhase => {
                return Err(GameError::WrongPhase { phase });
            }
            QuestionPhase::FinalReveal => {}
            _ => {
                let mut current = phase;
                while current != QuestionPhase::FinalReveal {
                    current = self.transition(qi, current, now)?;
                }
            }
        }
        Ok(self.resolve(qi, now))
    }

    /// Settle the pot for a question, once. Later calls return the stored
    /// outcome untouched.
    pub(crate) fn resolve(&mut self, qi: usize, now: DateTime<Utc>) -> Resolution {
        if let Some(recorded) = &self.questions[qi].resolution {
            return recorded.clone();
        }

        let correct = self.questions[qi].question.correct_answer;
        let pot = self.questions[qi].pot_size();
        let eligible: Vec<PlayerGuess> = {
            let qs = &self.questions[qi];
            qs.guesses
                .iter()
                .filter(|g| qs.standing_of(g.player_id) != Some(Standing::FoldedForQuestion))
                .cloned()
                .collect()
        };

        // Narrowest containing range first; closest midpoint as fallback.
        let valid: Vec<&PlayerGuess> = eligible.iter().filter(|g| g.contains(correct)).collect();
        let mut winners: Vec<PlayerId> = if let Some(best) = valid.iter().map(|g| g.width()).min() {
            valid
                .iter()
                .filter(|g| g.width() == best)
                .map(|g| g.player_id)
                .collect()
        } else if let Some(best) = eligible
            .iter()
            .map(|g| g.median_distance_doubled(correct))
            .min()
        {
            eligible
                .iter()
                .filter(|g| g.median_distance_doubled(correct) == best)
                .map(|g| g.player_id)
                .collect()
        } else {
            // Nobody left a live guess; the pot is void.
            Vec::new()
        };
        winners.sort_unstable();

        let mut win_amount = 0;
        let mut payouts: Vec<Payout> = Vec::new();
        if let Ok(count) = u32::try_from(winners.len()) {
            if count > 0 {
                win_amount = pot / count;
                let remainder = pot % count;
                payouts = winners
                    .iter()
                    .enumerate()
                    .map(|(i, &player_id)| Payout {
                        player_id,
                        // Leftover chips go one each to the lowest ids.
                        amount: if (i as u32) < remainder {
                            win_amount + 1
                        } else {
                            win_amount
                        },
                    })
                    .collect();
            }
        }

        for payout in &payouts {
            if let Ok(pi) = self.player_index(payout.player_id) {
                self.players[pi].chips += payout.amount;
                self.push_change(Change::updated(EntityKind::Player, payout.player_id));
            }
        }

        for pi in 0..self.players.len() {
            if self.players[pi].is_active() && self.players[pi].chips == 0 {
                self.players[pi].status = PlayerStatus::Bankrupt;
                let player_id = self.players[pi].id;
                log::info!("game {}: player {player_id} went bankrupt", self.game.id);
                self.push_change(Change::updated(EntityKind::Player, player_id));
            }
        }

        self.score_predictions(qi, &winners);

        let resolution = Resolution {
            winners,
            payouts,
            pot_size: pot,
            win_amount,
            correct_answer: correct,
            resolved_at: now,
        };
        log::info!(
            "game {}: {} resolved, answer {correct}, pot {pot} to {:?}",
            self.game.id,
            self.questions[qi].question,
            resolution.winners
        );
        self.questions[qi].resolution = Some(resolution.clone());
        resolution
    }
}
