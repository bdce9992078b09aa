use std::fmt::{self};
use tokio::sync::{mpsc, oneshot};

use crate::game::{
    entities::{
        Answer, Bet, BetAction, Chips, DisplayName, Player, PlayerGuess, PlayerId, Prediction,
        Question, QuestionId, SessionId,
    },
    errors::GameResult,
    events::Change,
    state::Resolution,
    view::GameView,
};

/// Response channel for one request.
pub type Reply<T> = oneshot::Sender<GameResult<T>>;

/// Everything a game actor can be asked to do. Requests carry their own
/// reply channel; fire-and-forget variants carry none.
#[derive(Debug)]
pub enum GameMessage {
    AddQuestion {
        text: String,
        correct_answer: Answer,
        ante: Chips,
        order_num: u32,
        hints: Vec<String>,
        reply: Reply<Question>,
    },
    Join {
        session_id: SessionId,
        display_name: DisplayName,
        reply: Reply<Player>,
    },
    Start {
        player_id: PlayerId,
        reply: Reply<QuestionId>,
    },
    Leave {
        player_id: PlayerId,
        reply: Reply<Player>,
    },
    SubmitGuess {
        player_id: PlayerId,
        question_id: QuestionId,
        lower_bound: Answer,
        upper_bound: Answer,
        is_final: bool,
        reply: Reply<PlayerGuess>,
    },
    SubmitBet {
        player_id: PlayerId,
        question_id: QuestionId,
        round_number: u8,
        action: BetAction,
        amount: Chips,
        reply: Reply<Bet>,
    },
    SubmitPrediction {
        player_id: PlayerId,
        question_id: QuestionId,
        predicted_winner_id: PlayerId,
        reply: Reply<Prediction>,
    },
    Rejoin {
        player_id: PlayerId,
        reply: Reply<Player>,
    },
    Resolve {
        question_id: QuestionId,
        reply: Reply<Resolution>,
    },
    GetView {
        session_id: Option<SessionId>,
        reply: oneshot::Sender<GameView>,
    },
    Subscribe {
        subscriber_id: u64,
        sender: mpsc::Sender<Change>,
        reply: oneshot::Sender<()>,
    },
    Unsubscribe {
        subscriber_id: u64,
    },
    Shutdown,
}

impl fmt::Display for GameMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::AddQuestion { .. } => "add question",
            Self::Join { .. } => "join",
            Self::Start { .. } => "start",
            Self::Leave { .. } => "leave",
            Self::SubmitGuess { .. } => "submit guess",
            Self::SubmitBet { .. } => "submit bet",
            Self::SubmitPrediction { .. } => "submit prediction",
            Self::Rejoin { .. } => "rejoin",
            Self::Resolve { .. } => "resolve",
            Self::GetView { .. } => "get view",
            Self::Subscribe { .. } => "subscribe",
            Self::Unsubscribe { .. } => "unsubscribe",
            Self::Shutdown => "shutdown",
        };
        write!(f, "{repr}")
    }
}
