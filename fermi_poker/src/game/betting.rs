//! Betting rules.
//!
//! Betting here is turn-free: while a round is open any eligible player may
//! act, and the round completes once every `ActiveForQuestion` player has
//! matched the round's highest bet or folded. Every chip that leaves a stack
//! lands in exactly one [`Bet`] row, so the pot is always the plain sum of
//! the ledger.

use chrono::{DateTime, Utc};

use super::{
    constants,
    entities::{Bet, BetAction, Chips, PlayerId, PlayerStanding, QuestionId, Standing},
    errors::{GameError, GameResult},
    events::{Change, EntityKind},
    state::{GameState, QuestionState},
};

impl QuestionState {
    /// Sum of every bet amount for this question, antes included.
    #[must_use]
    pub fn pot_size(&self) -> Chips {
        self.bets.iter().map(|b| b.amount).sum()
    }

    /// Highest single bet amount recorded in the given round, 0 if none.
    /// Antes live in round 0, so rounds 1 through 3 each open at 0.
    #[must_use]
    pub fn highest_bet(&self, round: u8) -> Chips {
        self.bets
            .iter()
            .filter(|b| b.round_number == round)
            .map(|b| b.amount)
            .max()
            .unwrap_or(0)
    }

    /// The player's largest bet amount in the round. Matching the round
    /// means this equals [`Self::highest_bet`].
    #[must_use]
    pub fn round_contribution(&self, player_id: PlayerId, round: u8) -> Chips {
        self.bets
            .iter()
            .filter(|b| b.round_number == round && b.player_id == player_id)
            .map(|b| b.amount)
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn has_checked(&self, player_id: PlayerId, round: u8) -> bool {
        self.bets
            .iter()
            .any(|b| {
                b.round_number == round
                    && b.player_id == player_id
                    && b.action == BetAction::Check
            })
    }

    /// A round is complete when every player still standing has spoken: all
    /// checked around when nothing is on the table, or everyone has matched
    /// the highest bet. Folded and busted players are not waited on, so a
    /// round with nobody left completes immediately.
    #[must_use]
    pub fn is_round_complete(&self, round: u8) -> bool {
        let highest = self.highest_bet(round);
        self.standings
            .iter()
            .filter(|s| s.standing == Standing::ActiveForQuestion)
            .all(|s| {
                if highest == 0 {
                    self.has_checked(s.player_id, round)
                } else {
                    self.round_contribution(s.player_id, round) == highest
                }
            })
    }
}

impl GameState {
    /// Place a bet in the open round. Antes are not placed through here;
    /// they are charged automatically when a question activates.
    pub fn submit_bet(
        &mut self,
        player_id: PlayerId,
        question_id: QuestionId,
        round_number: u8,
        action: BetAction,
        amount: Chips,
        now: DateTime<Utc>,
    ) -> GameResult<Bet> {
        self.sweep(now);
        let qi = self.question_index(question_id)?;
        let pi = self.player_index(player_id)?;
        if !self.players[pi].is_active() {
            return Err(GameError::PlayerNotActive);
        }
        let phase = self.questions[qi].phase();
        let Some(current_round) = phase.betting_round() else {
            return Err(GameError::WrongPhase { phase });
        };
        match self.questions[qi].standing_of(player_id) {
            None => return Err(GameError::NotInQuestion),
            Some(Standing::FoldedForQuestion) => return Err(GameError::FoldedOut),
            Some(Standing::BustedThisQuestion) => return Err(GameError::BustedOut),
            Some(Standing::ActiveForQuestion) => {}
        }
        if round_number != current_round {
            return Err(GameError::WrongRound {
                submitted: round_number,
                current: current_round,
            });
        }

        let highest = self.questions[qi].highest_bet(current_round);
        let chips = self.players[pi].chips;
        let staked: Chips = match action {
            BetAction::Ante => return Err(GameError::ManualAnte),
            BetAction::Check => {
                if highest > 0 {
                    return Err(GameError::CheckWithOpenBet { highest });
                }
                0
            }
            BetAction::Call => {
                if highest == 0 {
                    return Err(GameError::CallWithoutBet);
                }
                if chips < highest {
                    return Err(GameError::InsufficientChips {
                        required: highest,
                        available: chips,
                    });
                }
                highest
            }
            BetAction::Raise => {
                if amount <= highest {
                    return Err(GameError::RaiseTooSmall { highest });
                }
                if chips < amount {
                    return Err(GameError::InsufficientChips {
                        required: amount,
                        available: chips,
                    });
                }
                amount
            }
            BetAction::Fold => 0,
        };

        self.players[pi].chips -= staked;
        let bet = Bet {
            id: self.ids.next(),
            player_id,
            question_id,
            round_number: current_round,
            action,
            amount: staked,
            timestamp: now,
        };
        log::debug!(
            "game {}: player {player_id} round {current_round}: {bet}",
            self.game.id
        );
        self.questions[qi].bets.push(bet.clone());
        self.push_change(Change::inserted(EntityKind::Bet, bet.id));
        if staked > 0 {
            self.push_change(Change::updated(EntityKind::Player, player_id));
        }
        if action == BetAction::Fold {
            self.fold_standing(qi, player_id);
        }
        self.sweep(now);
        Ok(bet)
    }

    /// Charge every game-active player the question's ante and seat them in
    /// the question. A player who cannot cover it contributes whatever they
    /// have and sits the betting out as `BustedThisQuestion`.
    pub(crate) fn charge_antes(&mut self, qi: usize, now: DateTime<Utc>) {
        let ante = self.questions[qi].question.ante;
        let question_id = self.questions[qi].question.id;
        let seats: Vec<usize> = (0..self.players.len())
            .filter(|&pi| self.players[pi].is_active())
            .collect();
        for pi in seats {
            let player_id = self.players[pi].id;
            let chips = self.players[pi].chips;
            let (staked, standing) = if chips >= ante {
                (ante, Standing::ActiveForQuestion)
            } else {
                log::info!(
                    "game {}: player {player_id} busted on the ante ({chips} of {ante})",
                    self.game.id
                );
                (chips, Standing::BustedThisQuestion)
            };
            self.players[pi].chips -= staked;
            let bet = Bet {
                id: self.ids.next(),
                player_id,
                question_id,
                round_number: constants::ANTE_ROUND,
                action: BetAction::Ante,
                amount: staked,
                timestamp: now,
            };
            self.push_change(Change::inserted(EntityKind::Bet, bet.id));
            self.push_change(Change::updated(EntityKind::Player, player_id));
            self.questions[qi].bets.push(bet);
            self.questions[qi].standings.push(PlayerStanding {
                player_id,
                question_id,
                standing,
            });
            self.push_change(Change::inserted(EntityKind::Standing, player_id));
        }
    }

    pub(crate) fn fold_standing(&mut self, qi: usize, player_id: PlayerId) {
        if let Some(row) = self.questions[qi]
            .standings
            .iter_mut()
            .find(|s| s.player_id == player_id)
        {
            row.standing = Standing::FoldedForQuestion;
        }
        self.push_change(Change::updated(EntityKind::Standing, player_id));
    }
}
