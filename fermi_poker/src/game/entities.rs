use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self};

use super::constants;

/// Type alias for chip amounts. Antes, bets, and player stacks are whole
/// chips (nobody banks fractions of a chip).
///
/// If a single game ever accumulates more than ~4.2 billion chips, the
/// ante was set far too high.
pub type Chips = u32;

/// Type alias for game identifiers.
pub type GameId = i64;

/// Type alias for question identifiers.
pub type QuestionId = i64;

/// Type alias for player identifiers.
pub type PlayerId = i64;

/// Type alias for hint identifiers.
pub type HintId = i64;

/// Type alias for bet ledger row identifiers.
pub type BetId = i64;

/// Numeric answers and guess bounds. Fermi questions ask for counts and
/// magnitudes, so a signed 64-bit integer covers everything from piano
/// tuners in Chicago to grains of sand on a beach.
pub type Answer = i64;

pub const DEFAULT_STARTING_CHIPS: Chips = 100;
pub const DEFAULT_ANTE: Chips = 10;
pub const DEFAULT_REENTRY_STAKE: Chips = 50;

/// Opaque per-player session token. The engine never interprets it; it
/// only has to stay stable across reconnects so a returning client maps
/// back to the same player.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(s: &str) -> Self {
        let token = s.trim().chars().take(constants::MAX_USER_INPUT_LENGTH).collect();
        Self(token)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Player-facing name shown at the table. Sanitized on construction:
/// control characters become spaces, surrounding whitespace is dropped,
/// and the result is length-capped.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(s: &str) -> Self {
        let name = s
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect::<String>()
            .trim()
            .chars()
            .take(constants::MAX_USER_INPUT_LENGTH / 8)
            .collect::<String>()
            .trim_end()
            .to_string();
        Self(name)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for DisplayName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for DisplayName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    WaitingForPlayers,
    Active,
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::WaitingForPlayers => "waiting_for_players",
            Self::Active => "active",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Lifecycle of a single question. `Ord` follows play order, which is what
/// makes "status transitions only forward" a plain comparison.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionPhase {
    NotStarted,
    GuessingPhase,
    #[serde(rename = "betting_round_1")]
    BettingRound1,
    #[serde(rename = "betting_round_2")]
    BettingRound2,
    #[serde(rename = "betting_round_3")]
    BettingRound3,
    FinalReveal,
}

impl QuestionPhase {
    /// The open betting round this phase corresponds to, if any.
    #[must_use]
    pub fn betting_round(self) -> Option<u8> {
        match self {
            Self::BettingRound1 => Some(1),
            Self::BettingRound2 => Some(2),
            Self::BettingRound3 => Some(3),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_betting(self) -> bool {
        self.betting_round().is_some()
    }

    /// Successor phase in play order.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::GuessingPhase),
            Self::GuessingPhase => Some(Self::BettingRound1),
            Self::BettingRound1 => Some(Self::BettingRound2),
            Self::BettingRound2 => Some(Self::BettingRound3),
            Self::BettingRound3 => Some(Self::FinalReveal),
            Self::FinalReveal => None,
        }
    }
}

impl fmt::Display for QuestionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::NotStarted => "not_started",
            Self::GuessingPhase => "guessing_phase",
            Self::BettingRound1 => "betting_round_1",
            Self::BettingRound2 => "betting_round_2",
            Self::BettingRound3 => "betting_round_3",
            Self::FinalReveal => "final_reveal",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,
    Bankrupt,
    LeftGame,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Active => "active",
            Self::Bankrupt => "bankrupt",
            Self::LeftGame => "left_game",
        };
        write!(f, "{repr}")
    }
}

/// A player's standing within one question's betting.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    // In the question and expected to match bets.
    ActiveForQuestion,
    // Out of the question by choice. Chips already bet stay in the pot.
    FoldedForQuestion,
    // Couldn't cover the ante. Still eligible to guess and win, but
    // excluded from the open betting rounds.
    BustedThisQuestion,
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::ActiveForQuestion => "active_for_question",
            Self::FoldedForQuestion => "folded_for_question",
            Self::BustedThisQuestion => "busted_this_question",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Game {
    pub id: GameId,
    pub status: GameStatus,
    pub meta_game_on: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub game_id: GameId,
    pub question_text: String,
    /// Redacted at the view layer until the final reveal.
    pub correct_answer: Answer,
    pub ante: Chips,
    pub order_num: u32,
    pub phase: QuestionPhase,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "question #{} ({})", self.order_num, self.phase)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub game_id: GameId,
    pub session_id: SessionId,
    pub display_name: DisplayName,
    pub chips: Chips,
    pub status: PlayerStatus,
    pub correct_preds: u32,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    #[must_use]
    pub fn new(
        id: PlayerId,
        game_id: GameId,
        session_id: SessionId,
        display_name: DisplayName,
        chips: Chips,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            game_id,
            session_id,
            display_name,
            chips,
            status: PlayerStatus::Active,
            correct_preds: 0,
            joined_at,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PlayerStatus::Active
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} chips, {})", self.display_name, self.chips, self.status)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub question_id: QuestionId,
    pub standing: Standing,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerGuess {
    pub player_id: PlayerId,
    pub question_id: QuestionId,
    pub lower_bound: Answer,
    pub upper_bound: Answer,
    #[serde(rename = "final")]
    pub is_final: bool,
    pub submitted_at: DateTime<Utc>,
}

impl PlayerGuess {
    #[must_use]
    pub fn contains(&self, answer: Answer) -> bool {
        self.lower_bound <= answer && answer <= self.upper_bound
    }

    /// Range width. Widened to 128 bits so extreme bounds can't wrap.
    #[must_use]
    pub fn width(&self) -> i128 {
        i128::from(self.upper_bound) - i128::from(self.lower_bound)
    }

    /// Twice the distance from the range midpoint to `answer`. Comparing
    /// doubled distances keeps odd-width midpoints exact without floats.
    #[must_use]
    pub fn median_distance_doubled(&self, answer: Answer) -> i128 {
        (i128::from(self.lower_bound) + i128::from(self.upper_bound) - 2 * i128::from(answer)).abs()
    }
}

impl fmt::Display for PlayerGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower_bound, self.upper_bound)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BetAction {
    Ante,
    Call,
    Check,
    Fold,
    Raise,
}

impl fmt::Display for BetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Ante => "ante",
            Self::Call => "call",
            Self::Check => "check",
            Self::Fold => "fold",
            Self::Raise => "raise",
        };
        write!(f, "{repr}")
    }
}

/// One row of the append-only bet ledger for a question.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bet {
    pub id: BetId,
    pub player_id: PlayerId,
    pub question_id: QuestionId,
    /// 0 for the automatic ante, 1..=3 for the open betting rounds.
    pub round_number: u8,
    pub action: BetAction,
    pub amount: Chips,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.amount;
        let repr = match self.action {
            BetAction::Ante => format!("ante of {amount}"),
            BetAction::Call => format!("call of {amount}"),
            BetAction::Check => "check".to_string(),
            BetAction::Fold => "fold".to_string(),
            BetAction::Raise => format!("raise to {amount}"),
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Hint {
    pub id: HintId,
    pub question_id: QuestionId,
    pub hint_order: u32,
    pub hint_text: String,
    pub revealed_at: Option<DateTime<Utc>>,
}

impl Hint {
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed_at.is_some()
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Prediction {
    pub player_id: PlayerId,
    pub question_id: QuestionId,
    pub predicted_winner_id: PlayerId,
    pub is_correct: Option<bool>,
    pub submitted_at: DateTime<Utc>,
}
