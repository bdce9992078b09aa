//! Authoritative state for a single game.
//!
//! [`GameState`] owns everything: the roster, the ordered question list, and
//! the per-question ledgers. It is a purely synchronous structure; the actor
//! in [`crate::table`] serializes access to it. Operations are spread over
//! sibling modules by concern:
//!
//! - lifecycle (create, add question, join, leave, start) lives here,
//! - betting legality in [`super::betting`],
//! - guesses and resolution in [`super::resolution`],
//! - phase transitions and sweeping in [`super::scheduler`],
//! - predictions and rejoining in [`super::metagame`],
//! - redacted snapshots in [`super::view`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

use super::{
    constants,
    entities::{
        Answer, Bet, Chips, DEFAULT_REENTRY_STAKE, DEFAULT_STARTING_CHIPS, DisplayName, Game,
        GameStatus, Hint, Player, PlayerGuess, PlayerId, PlayerStanding, PlayerStatus, Prediction,
        Question, QuestionId, QuestionPhase, SessionId, Standing,
    },
    errors::{GameError, GameResult},
    events::{Change, EntityKind},
};

/// Process-wide id sequence. Cloning shares the counter, so every entity
/// minted by any game gets a unique id.
#[derive(Clone, Debug)]
pub struct IdSeq(Arc<AtomicI64>);

impl IdSeq {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicI64::new(0)))
    }

    pub fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for IdSeq {
    fn default() -> Self {
        Self::new()
    }
}

/// Tunables for a game. The server builds one of these from its environment;
/// library users get sensible defaults.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSettings {
    pub starting_chips: Chips,
    pub guess_seconds: i64,
    pub reveal_hold_seconds: i64,
    pub reentry_stake: Chips,
    pub reentry_predictions: u32,
    pub min_players: usize,
    pub max_players: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            starting_chips: DEFAULT_STARTING_CHIPS,
            guess_seconds: constants::GUESSING_PHASE_SECS,
            reveal_hold_seconds: constants::REVEAL_HOLD_SECS,
            reentry_stake: DEFAULT_REENTRY_STAKE,
            reentry_predictions: constants::REENTRY_PREDICTIONS,
            min_players: constants::MIN_PLAYERS_TO_START,
            max_players: constants::MAX_PLAYERS,
        }
    }
}

/// One payout line of a resolved question.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payout {
    pub player_id: PlayerId,
    pub amount: Chips,
}

/// Recorded outcome of a question. Stored on the question state the moment
/// resolution runs; every later resolution call returns this verbatim.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Resolution {
    pub winners: Vec<PlayerId>,
    pub payouts: Vec<Payout>,
    pub pot_size: Chips,
    /// Base share per winner before remainder chips.
    pub win_amount: Chips,
    pub correct_answer: Answer,
    pub resolved_at: DateTime<Utc>,
}

/// A question plus everything played against it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QuestionState {
    pub question: Question,
    pub hints: Vec<Hint>,
    pub guesses: Vec<PlayerGuess>,
    pub bets: Vec<Bet>,
    pub standings: Vec<PlayerStanding>,
    pub predictions: Vec<Prediction>,
    pub guess_deadline: Option<DateTime<Utc>>,
    pub resolution: Option<Resolution>,
}

impl QuestionState {
    #[must_use]
    pub fn new(question: Question, hints: Vec<Hint>) -> Self {
        Self {
            question,
            hints,
            guesses: Vec::new(),
            bets: Vec::new(),
            standings: Vec::new(),
            predictions: Vec::new(),
            guess_deadline: None,
            resolution: None,
        }
    }

    #[must_use]
    pub fn guess_of(&self, player_id: PlayerId) -> Option<&PlayerGuess> {
        self.guesses.iter().find(|g| g.player_id == player_id)
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    #[must_use]
    pub fn phase(&self) -> QuestionPhase {
        self.question.phase
    }

    #[must_use]
    pub fn prediction_of(&self, player_id: PlayerId) -> Option<&Prediction> {
        self.predictions.iter().find(|p| p.player_id == player_id)
    }

    #[must_use]
    pub fn standing_of(&self, player_id: PlayerId) -> Option<Standing> {
        self.standings
            .iter()
            .find(|s| s.player_id == player_id)
            .map(|s| s.standing)
    }
}

/// The whole of one game. Mutating operations return the touched entity (or
/// a [`GameError`]) and record [`Change`] events for the actor to publish.
#[derive(Clone, Debug)]
pub struct GameState {
    pub game: Game,
    pub players: Vec<Player>,
    /// Sorted by `order_num` ascending.
    pub questions: Vec<QuestionState>,
    pub settings: GameSettings,
    pub(crate) events: VecDeque<Change>,
    pub(crate) ids: IdSeq,
}

impl GameState {
    #[must_use]
    pub fn create(
        meta_game_on: bool,
        settings: GameSettings,
        ids: IdSeq,
        now: DateTime<Utc>,
    ) -> Self {
        let game = Game {
            id: ids.next(),
            status: GameStatus::WaitingForPlayers,
            meta_game_on,
            created_at: now,
        };
        let game_id = game.id;
        let mut state = Self {
            game,
            players: Vec::new(),
            questions: Vec::new(),
            settings,
            events: VecDeque::new(),
            ids,
        };
        state.push_change(Change::inserted(EntityKind::Game, game_id));
        state
    }

    /// Queue a question while the lobby is still open. Hints reveal one per
    /// betting round, in the order given here.
    pub fn add_question(
        &mut self,
        text: &str,
        correct_answer: Answer,
        ante: Chips,
        order_num: u32,
        hints: Vec<String>,
    ) -> GameResult<Question> {
        match self.game.status {
            GameStatus::Finished => return Err(GameError::GameFinished),
            GameStatus::Active => return Err(GameError::GameAlreadyStarted),
            GameStatus::WaitingForPlayers => {}
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::EmptyText);
        }
        if correct_answer <= 0 {
            return Err(GameError::NonPositiveAnswer);
        }
        if ante == 0 {
            return Err(GameError::NonPositiveAnte);
        }
        if order_num == 0 {
            return Err(GameError::NonPositiveOrder);
        }
        if self
            .questions
            .iter()
            .any(|q| q.question.order_num == order_num)
        {
            return Err(GameError::DuplicateOrder(order_num));
        }
        let hints: Vec<&str> = hints.iter().map(|h| h.trim()).collect();
        if hints.iter().any(|h| h.is_empty()) {
            return Err(GameError::EmptyText);
        }

        let question = Question {
            id: self.ids.next(),
            game_id: self.game.id,
            question_text: text.to_string(),
            correct_answer,
            ante,
            order_num,
            phase: QuestionPhase::NotStarted,
        };
        let hint_rows: Vec<Hint> = hints
            .into_iter()
            .enumerate()
            .map(|(i, h)| Hint {
                id: self.ids.next(),
                question_id: question.id,
                hint_order: u32::try_from(i).unwrap_or(u32::MAX).saturating_add(1),
                hint_text: h.to_string(),
                revealed_at: None,
            })
            .collect();

        self.push_change(Change::inserted(EntityKind::Question, question.id));
        for hint in &hint_rows {
            self.push_change(Change::inserted(EntityKind::Hint, hint.id));
        }
        let pos = self
            .questions
            .partition_point(|q| q.question.order_num < order_num);
        self.questions
            .insert(pos, QuestionState::new(question.clone(), hint_rows));
        Ok(question)
    }

    /// Take a seat. Joining again with the same session token returns the
    /// existing seat, which is how reconnects work.
    pub fn join(
        &mut self,
        session_id: SessionId,
        display_name: DisplayName,
        now: DateTime<Utc>,
    ) -> GameResult<Player> {
        if session_id.is_empty() {
            return Err(GameError::EmptySessionId);
        }
        if let Some(existing) = self.players.iter().find(|p| p.session_id == session_id) {
            return Ok(existing.clone());
        }
        if display_name.is_empty() {
            return Err(GameError::EmptyDisplayName);
        }
        match self.game.status {
            GameStatus::Finished => return Err(GameError::GameFinished),
            GameStatus::Active => return Err(GameError::GameAlreadyStarted),
            GameStatus::WaitingForPlayers => {}
        }
        let seated = self
            .players
            .iter()
            .filter(|p| p.status != PlayerStatus::LeftGame)
            .count();
        if seated >= self.settings.max_players {
            return Err(GameError::CapacityReached);
        }

        let player = Player::new(
            self.ids.next(),
            self.game.id,
            session_id,
            display_name,
            self.settings.starting_chips,
            now,
        );
        self.push_change(Change::inserted(EntityKind::Player, player.id));
        log::info!("game {}: {} joined", self.game.id, player);
        self.players.push(player.clone());
        Ok(player)
    }

    /// Leave for good. Folds the player out of the open question; idempotent
    /// for players who already left.
    pub fn leave(&mut self, player_id: PlayerId, now: DateTime<Utc>) -> GameResult<Player> {
        self.sweep(now);
        let pi = self.player_index(player_id)?;
        if self.players[pi].status == PlayerStatus::LeftGame {
            return Ok(self.players[pi].clone());
        }
        self.players[pi].status = PlayerStatus::LeftGame;
        self.push_change(Change::updated(EntityKind::Player, player_id));
        log::info!("game {}: player {player_id} left", self.game.id);

        if let Some(qi) = self.current_index() {
            let open_standing = self.questions[qi].standings.iter().position(|s| {
                s.player_id == player_id && s.standing == Standing::ActiveForQuestion
            });
            if let Some(si) = open_standing {
                self.questions[qi].standings[si].standing = Standing::FoldedForQuestion;
                self.push_change(Change::updated(EntityKind::Standing, player_id));
            }
            // The departure may be what the question was waiting on.
            self.sweep(now);
        }
        Ok(self.players[pi].clone())
    }

    /// Open play. Host-only, needs enough players and at least one question;
    /// activates the first question immediately.
    pub fn start(&mut self, player_id: PlayerId, now: DateTime<Utc>) -> GameResult<QuestionId> {
        match self.game.status {
            GameStatus::Finished => return Err(GameError::GameFinished),
            GameStatus::Active => return Err(GameError::GameAlreadyStarted),
            GameStatus::WaitingForPlayers => {}
        }
        self.player_index(player_id)?;
        if self.host_id() != Some(player_id) {
            return Err(GameError::NotHost);
        }
        let active = self.players.iter().filter(|p| p.is_active()).count();
        if active < self.settings.min_players {
            return Err(GameError::NotEnoughPlayers(self.settings.min_players));
        }
        if self.questions.is_empty() {
            return Err(GameError::NoQuestions);
        }

        self.game.status = GameStatus::Active;
        self.push_change(Change::updated(EntityKind::Game, self.game.id));
        log::info!("game {} started by player {player_id}", self.game.id);
        self.activate_question(0, now)?;
        Ok(self.questions[0].question.id)
    }

    /// Index of the question currently in play. With questions activated in
    /// order and only ever advanced, this is the highest `order_num` that has
    /// moved past `not_started`.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.questions
            .iter()
            .rposition(|q| q.phase() != QuestionPhase::NotStarted)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionState> {
        self.current_index().map(|i| &self.questions[i])
    }

    pub fn drain_events(&mut self) -> Vec<Change> {
        self.events.drain(..).collect()
    }

    /// First-joined player still active. Decides who may start the game.
    #[must_use]
    pub fn host_id(&self) -> Option<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_active())
            .min_by_key(|p| (p.joined_at, p.id))
            .map(|p| p.id)
    }

    #[must_use]
    pub fn player_id_for_session(&self, session_id: &SessionId) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.session_id == *session_id)
            .map(|p| p.id)
    }

    pub(crate) fn player_index(&self, player_id: PlayerId) -> GameResult<usize> {
        self.players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound(player_id))
    }

    pub(crate) fn push_change(&mut self, change: Change) {
        self.events.push_back(change);
    }

    pub(crate) fn question_index(&self, question_id: QuestionId) -> GameResult<usize> {
        self.questions
            .iter()
            .position(|q| q.question.id == question_id)
            .ok_or(GameError::QuestionNotFound(question_id))
    }
}
