use serde::{Deserialize, Serialize};
use std::fmt::{self};

use super::entities::{Chips, GameId, PlayerId, QuestionId, QuestionPhase};

/// Coarse classification of a [`GameError`]. Callers that speak HTTP map
/// these onto status codes; the engine itself only cares that every
/// failure lands in exactly one bucket.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InvalidAction,
    NotFound,
    AlreadySubmitted,
    Conflict,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Validation => "validation",
            Self::InvalidAction => "invalid_action",
            Self::NotFound => "not_found",
            Self::AlreadySubmitted => "already_submitted",
            Self::Conflict => "conflict",
        };
        write!(f, "{repr}")
    }
}

/// Everything that can go wrong inside the engine. Rule violations are
/// ordinary return values here, not panics; the caller decides whether to
/// retry, re-read, or report.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum GameError {
    // Input validation.
    #[error("lower bound must be strictly less than upper bound")]
    InvalidBounds,
    #[error("correct answer must be positive")]
    NonPositiveAnswer,
    #[error("ante must be at least one chip")]
    NonPositiveAnte,
    #[error("order number must be positive")]
    NonPositiveOrder,
    #[error("a question with order number {0} already exists")]
    DuplicateOrder(u32),
    #[error("question text cannot be empty")]
    EmptyText,
    #[error("display name cannot be empty")]
    EmptyDisplayName,
    #[error("session id cannot be empty")]
    EmptySessionId,

    // Game lifecycle.
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("game is full")]
    CapacityReached,
    #[error("only the host can start the game")]
    NotHost,
    #[error("need at least {0} players to start")]
    NotEnoughPlayers(usize),
    #[error("cannot start a game with no questions")]
    NoQuestions,
    #[error("game is finished")]
    GameFinished,

    // Phase and turn discipline.
    #[error("action not allowed during {phase}")]
    WrongPhase { phase: QuestionPhase },
    #[error("bet names round {submitted} but round {current} is open")]
    WrongRound { submitted: u8, current: u8 },

    // Betting rules.
    #[error("cannot check against an open bet of {highest}")]
    CheckWithOpenBet { highest: Chips },
    #[error("nothing to call; check instead")]
    CallWithoutBet,
    #[error("need {required} chips but only {available} available")]
    InsufficientChips { required: Chips, available: Chips },
    #[error("raise must exceed the highest bet of {highest}")]
    RaiseTooSmall { highest: Chips },
    #[error("antes are charged automatically")]
    ManualAnte,

    // Participation.
    #[error("player is not part of this question")]
    NotInQuestion,
    #[error("player has folded out of this question")]
    FoldedOut,
    #[error("player busted on the ante and sits out the betting")]
    BustedOut,
    #[error("player is not active in this game")]
    PlayerNotActive,

    // Meta-game.
    #[error("cannot predict yourself as the winner")]
    SelfPrediction,
    #[error("predicted winner is not an active player")]
    PredictedNotActive,
    #[error("the meta-game is disabled for this game")]
    MetaGameOff,
    #[error("only bankrupt players can rejoin")]
    NotBankrupt,
    #[error("need {needed} correct predictions to rejoin, have {have}")]
    NotEnoughPredictions { needed: u32, have: u32 },

    // Lookups.
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("question {0} not found")]
    QuestionNotFound(QuestionId),
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    // Duplicate submissions.
    #[error("final guess already locked in")]
    GuessAlreadyFinal,
    #[error("prediction already submitted for this question")]
    PredictionAlreadySubmitted,

    // Lost races.
    #[error("question moved from {expected} to {actual}; re-read and retry")]
    PhaseConflict {
        expected: QuestionPhase,
        actual: QuestionPhase,
    },
}

impl GameError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidBounds
            | Self::NonPositiveAnswer
            | Self::NonPositiveAnte
            | Self::NonPositiveOrder
            | Self::DuplicateOrder(_)
            | Self::EmptyText
            | Self::EmptyDisplayName
            | Self::EmptySessionId => ErrorKind::Validation,
            Self::GameAlreadyStarted
            | Self::CapacityReached
            | Self::NotHost
            | Self::NotEnoughPlayers(_)
            | Self::NoQuestions
            | Self::GameFinished
            | Self::WrongPhase { .. }
            | Self::WrongRound { .. }
            | Self::CheckWithOpenBet { .. }
            | Self::CallWithoutBet
            | Self::InsufficientChips { .. }
            | Self::RaiseTooSmall { .. }
            | Self::ManualAnte
            | Self::NotInQuestion
            | Self::FoldedOut
            | Self::BustedOut
            | Self::PlayerNotActive
            | Self::SelfPrediction
            | Self::PredictedNotActive
            | Self::MetaGameOff
            | Self::NotBankrupt
            | Self::NotEnoughPredictions { .. } => ErrorKind::InvalidAction,
            Self::GameNotFound(_) | Self::QuestionNotFound(_) | Self::PlayerNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::GuessAlreadyFinal | Self::PredictionAlreadySubmitted => {
                ErrorKind::AlreadySubmitted
            }
            Self::PhaseConflict { .. } => ErrorKind::Conflict,
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
