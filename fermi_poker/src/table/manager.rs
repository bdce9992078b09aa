//! The game registry.
//!
//! [`GameManager`] spawns an actor per game and keeps the routing indices
//! that map questions and players back to their game, so callers can act on
//! a question or player id alone. Each method is one request/response round
//! trip over the owning actor's inbox; games never contend with each other.

use chrono::Utc;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::{
    sync::{RwLock, mpsc, oneshot},
    time::Duration,
};

use super::{
    actor::{GameActor, GameHandle},
    messages::GameMessage,
};
use crate::game::{
    entities::{
        Answer, Bet, BetAction, Chips, DisplayName, Game, GameId, Player, PlayerGuess, PlayerId,
        Prediction, Question, QuestionId, SessionId,
    },
    errors::{GameError, GameResult},
    events::Change,
    state::{GameSettings, GameState, IdSeq, Resolution},
    view::GameView,
};

/// How far a subscriber may fall behind before notifications are skipped.
const EVENT_BUFFER: usize = 256;

/// How often each actor sweeps its deadlines.
pub const DEFAULT_TICK: Duration = Duration::from_millis(1000);

pub struct GameManager {
    ids: IdSeq,
    settings: GameSettings,
    tick: Duration,
    games: RwLock<HashMap<GameId, GameHandle>>,
    questions: RwLock<HashMap<QuestionId, GameId>>,
    players: RwLock<HashMap<PlayerId, GameId>>,
    next_subscriber: AtomicU64,
}

impl GameManager {
    #[must_use]
    pub fn new(settings: GameSettings, tick: Duration) -> Self {
        Self {
            ids: IdSeq::new(),
            settings,
            tick,
            games: RwLock::new(HashMap::new()),
            questions: RwLock::new(HashMap::new()),
            players: RwLock::new(HashMap::new()),
            next_subscriber: AtomicU64::new(0),
        }
    }

    pub async fn create_game(&self, meta_game_on: bool) -> Game {
        let state = GameState::create(meta_game_on, self.settings, self.ids.clone(), Utc::now());
        let game = state.game.clone();
        let handle = GameActor::spawn(state, self.tick);
        self.games.write().await.insert(game.id, handle);
        log::info!("game {} created (meta-game {})", game.id, game.meta_game_on);
        game
    }

    pub async fn add_question(
        &self,
        game_id: GameId,
        text: String,
        correct_answer: Answer,
        ante: Chips,
        order_num: u32,
        hints: Vec<String>,
    ) -> GameResult<Question> {
        let handle = self.game(game_id).await?;
        let (reply, response) = oneshot::channel();
        handle
            .send(GameMessage::AddQuestion {
                text,
                correct_answer,
                ante,
                order_num,
                hints,
                reply,
            })
            .await?;
        let question = response
            .await
            .map_err(|_| GameError::GameNotFound(game_id))??;
        self.questions.write().await.insert(question.id, game_id);
        Ok(question)
    }

    pub async fn join_game(
        &self,
        game_id: GameId,
        session_id: SessionId,
        display_name: DisplayName,
    ) -> GameResult<Player> {
        let handle = self.game(game_id).await?;
        let (reply, response) = oneshot::channel();
        handle
            .send(GameMessage::Join {
                session_id,
                display_name,
                reply,
            })
            .await?;
        let player = response
            .await
            .map_err(|_| GameError::GameNotFound(game_id))??;
        self.players.write().await.insert(player.id, game_id);
        Ok(player)
    }

    pub async fn start_game(&self, game_id: GameId, player_id: PlayerId) -> GameResult<QuestionId> {
        let handle = self.game(game_id).await?;
        let (reply, response) = oneshot::channel();
        handle.send(GameMessage::Start { player_id, reply }).await?;
        response.await.map_err(|_| GameError::GameNotFound(game_id))?
    }

    pub async fn leave_game(&self, player_id: PlayerId) -> GameResult<Player> {
        let handle = self.game_for_player(player_id).await?;
        let (reply, response) = oneshot::channel();
        handle.send(GameMessage::Leave { player_id, reply }).await?;
        response
            .await
            .map_err(|_| GameError::PlayerNotFound(player_id))?
    }

    pub async fn submit_guess(
        &self,
        player_id: PlayerId,
        question_id: QuestionId,
        lower_bound: Answer,
        upper_bound: Answer,
        is_final: bool,
    ) -> GameResult<PlayerGuess> {
        let handle = self.game_for_question(question_id).await?;
        let (reply, response) = oneshot::channel();
        handle
            .send(GameMessage::SubmitGuess {
                player_id,
                question_id,
                lower_bound,
                upper_bound,
                is_final,
                reply,
            })
            .await?;
        response
            .await
            .map_err(|_| GameError::QuestionNotFound(question_id))?
    }

    pub async fn submit_bet(
        &self,
        player_id: PlayerId,
        question_id: QuestionId,
        round_number: u8,
        action: BetAction,
        amount: Chips,
    ) -> GameResult<Bet> {
        let handle = self.game_for_question(question_id).await?;
        let (reply, response) = oneshot::channel();
        handle
            .send(GameMessage::SubmitBet {
                player_id,
                question_id,
                round_number,
                action,
                amount,
                reply,
            })
            .await?;
        response
            .await
            .map_err(|_| GameError::QuestionNotFound(question_id))?
    }

    pub async fn submit_prediction(
        &self,
        player_id: PlayerId,
        question_id: QuestionId,
        predicted_winner_id: PlayerId,
    ) -> GameResult<Prediction> {
        let handle = self.game_for_question(question_id).await?;
        let (reply, response) = oneshot::channel();
        handle
            .send(GameMessage::SubmitPrediction {
                player_id,
                question_id,
                predicted_winner_id,
                reply,
            })
            .await?;
        response
            .await
            .map_err(|_| GameError::QuestionNotFound(question_id))?
    }

    pub async fn resolve_question(&self, question_id: QuestionId) -> GameResult<Resolution> {
        let handle = self.game_for_question(question_id).await?;
        let (reply, response) = oneshot::channel();
        handle
            .send(GameMessage::Resolve { question_id, reply })
            .await?;
        response
            .await
            .map_err(|_| GameError::QuestionNotFound(question_id))?
    }

    pub async fn rejoin_player(&self, player_id: PlayerId) -> GameResult<Player> {
        let handle = self.game_for_player(player_id).await?;
        let (reply, response) = oneshot::channel();
        handle.send(GameMessage::Rejoin { player_id, reply }).await?;
        response
            .await
            .map_err(|_| GameError::PlayerNotFound(player_id))?
    }

    pub async fn game_view(
        &self,
        game_id: GameId,
        session_id: Option<SessionId>,
    ) -> GameResult<GameView> {
        let handle = self.game(game_id).await?;
        let (reply, response) = oneshot::channel();
        handle
            .send(GameMessage::GetView { session_id, reply })
            .await?;
        response.await.map_err(|_| GameError::GameNotFound(game_id))
    }

    /// Register for a game's change feed. The receiver sees every change
    /// while it keeps up; the id unsubscribes later.
    pub async fn subscribe(&self, game_id: GameId) -> GameResult<(u64, mpsc::Receiver<Change>)> {
        let handle = self.game(game_id).await?;
        let subscriber_id = self.next_subscriber.fetch_add(1, Ordering::Relaxed) + 1;
        let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
        let (reply, ack) = oneshot::channel();
        handle
            .send(GameMessage::Subscribe {
                subscriber_id,
                sender,
                reply,
            })
            .await?;
        ack.await.map_err(|_| GameError::GameNotFound(game_id))?;
        Ok((subscriber_id, receiver))
    }

    pub async fn unsubscribe(&self, game_id: GameId, subscriber_id: u64) {
        if let Ok(handle) = self.game(game_id).await {
            let _ = handle.send(GameMessage::Unsubscribe { subscriber_id }).await;
        }
    }

    /// Stop a game's actor and drop it from every index. Returns whether
    /// the game existed.
    pub async fn remove_game(&self, game_id: GameId) -> bool {
        let removed = self.games.write().await.remove(&game_id);
        match removed {
            Some(handle) => {
                let _ = handle.send(GameMessage::Shutdown).await;
                self.questions.write().await.retain(|_, g| *g != game_id);
                self.players.write().await.retain(|_, g| *g != game_id);
                true
            }
            None => false,
        }
    }

    pub async fn game_count(&self) -> usize {
        self.games.read().await.len()
    }

    async fn game(&self, game_id: GameId) -> GameResult<GameHandle> {
        self.games
            .read()
            .await
            .get(&game_id)
            .cloned()
            .ok_or(GameError::GameNotFound(game_id))
    }

    async fn game_for_player(&self, player_id: PlayerId) -> GameResult<GameHandle> {
        let game_id = self
            .players
            .read()
            .await
            .get(&player_id)
            .copied()
            .ok_or(GameError::PlayerNotFound(player_id))?;
        self.game(game_id).await
    }

    async fn game_for_question(&self, question_id: QuestionId) -> GameResult<GameHandle> {
        let game_id = self
            .questions
            .read()
            .await
            .get(&question_id)
            .copied()
            .ok_or(GameError::QuestionNotFound(question_id))?;
        self.game(game_id).await
    }
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new(GameSettings::default(), DEFAULT_TICK)
    }
}
