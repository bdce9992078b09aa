//! Phase scheduling.
//!
//! A question advances on three triggers: a player action satisfies the
//! phase's completion condition, the guessing deadline expires, or a manual
//! resolution forces the reveal. Nothing here blocks or sleeps. Deadlines
//! are wall-clock timestamps checked by [`GameState::sweep`], which the
//! owning actor runs on a periodic tick and every operation runs before
//! validating, so observed phase always reflects elapsed time.
//!
//! Every transition is a compare-and-set against the expected phase; a
//! stale expectation surfaces as [`GameError::PhaseConflict`].

use chrono::{DateTime, Duration, Utc};

use super::{
    entities::{GameStatus, PlayerId, QuestionPhase, Standing},
    errors::{GameError, GameResult},
    events::{Change, EntityKind},
    state::GameState,
};

impl GameState {
    /// Apply every transition whose condition has come due. Idempotent for
    /// a given timestamp; cheap when nothing is due.
    pub fn sweep(&mut self, now: DateTime<Utc>) {
        if self.game.status != GameStatus::Active {
            return;
        }
        let Some(qi) = self.current_index() else {
            return;
        };
        match self.questions[qi].phase() {
            QuestionPhase::GuessingPhase => {
                let expired = self.questions[qi]
                    .guess_deadline
                    .is_some_and(|deadline| now >= deadline);
                if expired || self.all_final_guesses(qi) {
                    if let Err(err) = self.advance_from_guessing(qi, now) {
                        log::warn!("game {}: guessing advance failed: {err}", self.game.id);
                    }
                }
            }
            QuestionPhase::BettingRound1
            | QuestionPhase::BettingRound2
            | QuestionPhase::BettingRound3 => {
                if let Err(err) = self.try_complete_betting(qi, now) {
                    log::warn!("game {}: betting advance failed: {err}", self.game.id);
                }
            }
            QuestionPhase::FinalReveal => {
                let held = self.questions[qi].resolution.as_ref().is_some_and(|r| {
                    r.resolved_at + Duration::seconds(self.settings.reveal_hold_seconds) <= now
                });
                if held {
                    self.advance_past_reveal(qi, now);
                }
            }
            QuestionPhase::NotStarted => {}
        }
    }

    /// Open a question for play: guessing phase, fresh deadline, antes in.
    pub(crate) fn activate_question(&mut self, qi: usize, now: DateTime<Utc>) -> GameResult<()> {
        self.transition(qi, QuestionPhase::NotStarted, now)?;
        self.questions[qi].guess_deadline =
            Some(now + Duration::seconds(self.settings.guess_seconds));
        self.charge_antes(qi, now);
        Ok(())
    }

    /// Close the guessing phase. Players still standing who never committed
    /// a guess are folded out, then betting round one opens.
    pub(crate) fn advance_from_guessing(&mut self, qi: usize, now: DateTime<Utc>) -> GameResult<()> {
        let no_guess: Vec<PlayerId> = self.questions[qi]
            .standings
            .iter()
            .filter(|s| s.standing == Standing::ActiveForQuestion)
            .map(|s| s.player_id)
            .filter(|&player_id| self.questions[qi].guess_of(player_id).is_none())
            .collect();
        for player_id in no_guess {
            log::info!(
                "game {}: player {player_id} made no guess and folds",
                self.game.id
            );
            self.fold_standing(qi, player_id);
        }
        self.transition(qi, QuestionPhase::GuessingPhase, now)?;
        self.try_complete_betting(qi, now)
    }

    /// Step through betting rounds for as long as each round's completion
    /// condition already holds. Rounds with nobody standing drain straight
    /// through to the reveal.
    pub(crate) fn try_complete_betting(&mut self, qi: usize, now: DateTime<Utc>) -> GameResult<()> {
        while let Some(round) = self.questions[qi].phase().betting_round() {
            if !self.questions[qi].is_round_complete(round) {
                break;
            }
            self.transition(qi, self.questions[qi].phase(), now)?;
        }
        Ok(())
    }

    /// Compare-and-set phase advance. Runs the entry work for the new
    /// phase: hint reveals on betting rounds, resolution on the reveal.
    pub(crate) fn transition(
        &mut self,
        qi: usize,
        expected: QuestionPhase,
        now: DateTime<Utc>,
    ) -> GameResult<QuestionPhase> {
        let actual = self.questions[qi].phase();
        if actual != expected {
            return Err(GameError::PhaseConflict { expected, actual });
        }
        let Some(next) = expected.next() else {
            // Nothing lies beyond the reveal.
            return Ok(expected);
        };
        self.questions[qi].question.phase = next;
        let question_id = self.questions[qi].question.id;
        log::info!(
            "game {}: question {question_id} {expected} -> {next}",
            self.game.id
        );
        self.push_change(Change::updated(EntityKind::Question, question_id));
        if let Some(round) = next.betting_round() {
            self.reveal_hint(qi, round, now);
        }
        if next == QuestionPhase::FinalReveal {
            self.resolve(qi, now);
        }
        Ok(next)
    }

    fn all_final_guesses(&self, qi: usize) -> bool {
        let qs = &self.questions[qi];
        self.players.iter().filter(|p| p.is_active()).all(|p| {
            match qs.standing_of(p.id) {
                Some(Standing::ActiveForQuestion | Standing::BustedThisQuestion) => {
                    qs.guess_of(p.id).is_some_and(|g| g.is_final)
                }
                // Folded players and mid-question rejoiners are not waited on.
                _ => true,
            }
        })
    }

    /// After the reveal has been on display long enough, move on: activate
    /// the next question or finish the game.
    fn advance_past_reveal(&mut self, qi: usize, now: DateTime<Utc>) {
        if qi + 1 < self.questions.len() {
            if let Err(err) = self.activate_question(qi + 1, now) {
                log::warn!("game {}: next question activation failed: {err}", self.game.id);
            }
        } else {
            self.game.status = GameStatus::Finished;
            self.push_change(Change::updated(EntityKind::Game, self.game.id));
            log::info!("game {} finished", self.game.id);
        }
    }

    fn reveal_hint(&mut self, qi: usize, round: u8, now: DateTime<Utc>) {
        let mut revealed = None;
        if let Some(hint) = self.questions[qi]
            .hints
            .iter_mut()
            .find(|h| h.hint_order == u32::from(round) && !h.is_revealed())
        {
            hint.revealed_at = Some(now);
            revealed = Some(hint.id);
        }
        if let Some(hint_id) = revealed {
            log::info!(
                "game {}: hint {hint_id} revealed for round {round}",
                self.game.id
            );
            self.push_change(Change::updated(EntityKind::Hint, hint_id));
        }
    }
}
