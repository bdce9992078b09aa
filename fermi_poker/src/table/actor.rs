//! One actor per game.
//!
//! The actor owns its [`GameState`] outright; everything that touches a
//! game flows through the actor's inbox and is handled one message at a
//! time, which is what serializes concurrent play. A periodic tick sweeps
//! wall-clock deadlines so phases advance even when nobody is acting, and
//! after every message or tick the accumulated change events fan out to
//! subscribers.

use chrono::Utc;
use std::collections::HashMap;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    time::{self, Duration, MissedTickBehavior},
};

use super::messages::GameMessage;
use crate::game::{
    entities::GameId,
    errors::{GameError, GameResult},
    events::Change,
    state::GameState,
};

/// Room for queued requests before senders are backpressured.
const INBOX_BUFFER: usize = 64;

/// Address of a running game actor. Cheap to clone; dropping every clone
/// closes the inbox and stops the actor.
#[derive(Clone, Debug)]
pub struct GameHandle {
    game_id: GameId,
    sender: mpsc::Sender<GameMessage>,
}

impl GameHandle {
    #[must_use]
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Deliver a message to the actor. A closed inbox means the game is
    /// gone, which callers see as not found.
    pub async fn send(&self, message: GameMessage) -> GameResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| GameError::GameNotFound(self.game_id))
    }
}

pub struct GameActor {
    state: GameState,
    inbox: mpsc::Receiver<GameMessage>,
    subscribers: HashMap<u64, mpsc::Sender<Change>>,
    tick: Duration,
}

impl GameActor {
    /// Move the state into a fresh actor task and hand back its address.
    pub fn spawn(state: GameState, tick: Duration) -> GameHandle {
        let (sender, inbox) = mpsc::channel(INBOX_BUFFER);
        let game_id = state.game.id;
        let actor = Self {
            state,
            inbox,
            subscribers: HashMap::new(),
            tick,
        };
        tokio::spawn(actor.run());
        GameHandle { game_id, sender }
    }

    async fn run(mut self) {
        let game_id = self.state.game.id;
        log::info!("game {game_id}: actor up");
        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    match message {
                        Some(message) => {
                            if !self.handle(message) {
                                break;
                            }
                            self.publish();
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    self.state.sweep(Utc::now());
                    self.publish();
                }
            }
        }
        log::info!("game {game_id}: actor down");
    }

    /// Apply one message. Returns false when the actor should stop.
    fn handle(&mut self, message: GameMessage) -> bool {
        let now = Utc::now();
        log::debug!("game {}: handling {message}", self.state.game.id);
        match message {
            GameMessage::AddQuestion {
                text,
                correct_answer,
                ante,
                order_num,
                hints,
                reply,
            } => {
                let result =
                    self.state
                        .add_question(&text, correct_answer, ante, order_num, hints);
                let _ = reply.send(result);
            }
            GameMessage::Join {
                session_id,
                display_name,
                reply,
            } => {
                let _ = reply.send(self.state.join(session_id, display_name, now));
            }
            GameMessage::Start { player_id, reply } => {
                let _ = reply.send(self.state.start(player_id, now));
            }
            GameMessage::Leave { player_id, reply } => {
                let _ = reply.send(self.state.leave(player_id, now));
            }
            GameMessage::SubmitGuess {
                player_id,
                question_id,
                lower_bound,
                upper_bound,
                is_final,
                reply,
            } => {
                let result = self.state.submit_guess(
                    player_id,
                    question_id,
                    lower_bound,
                    upper_bound,
                    is_final,
                    now,
                );
                let _ = reply.send(result);
            }
            GameMessage::SubmitBet {
                player_id,
                question_id,
                round_number,
                action,
                amount,
                reply,
            } => {
                let result = self.state.submit_bet(
                    player_id,
                    question_id,
                    round_number,
                    action,
                    amount,
                    now,
                );
                let _ = reply.send(result);
            }
            GameMessage::SubmitPrediction {
                player_id,
                question_id,
                predicted_winner_id,
                reply,
            } => {
                let result =
                    self.state
                        .submit_prediction(player_id, question_id, predicted_winner_id, now);
                let _ = reply.send(result);
            }
            GameMessage::Rejoin { player_id, reply } => {
                let _ = reply.send(self.state.rejoin(player_id, now));
            }
            GameMessage::Resolve { question_id, reply } => {
                let _ = reply.send(self.state.resolve_question(question_id, now));
            }
            GameMessage::GetView { session_id, reply } => {
                // Reads reflect elapsed deadlines too.
                self.state.sweep(now);
                let viewer = session_id
                    .as_ref()
                    .and_then(|s| self.state.player_id_for_session(s));
                let _ = reply.send(self.state.view_for(viewer));
            }
            GameMessage::Subscribe {
                subscriber_id,
                sender,
                reply,
            } => {
                self.subscribers.insert(subscriber_id, sender);
                let _ = reply.send(());
            }
            GameMessage::Unsubscribe { subscriber_id } => {
                self.subscribers.remove(&subscriber_id);
            }
            GameMessage::Shutdown => return false,
        }
        true
    }

    /// Fan accumulated change events out to every subscriber. Slow
    /// subscribers miss notifications rather than stall the game; closed
    /// ones are dropped.
    fn publish(&mut self) {
        let changes = self.state.drain_events();
        for change in changes {
            let game_id = self.state.game.id;
            self.subscribers.retain(|id, sender| match sender.try_send(change) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Closed(_)) => {
                    log::debug!("game {game_id}: subscriber {id} gone");
                    false
                }
            });
        }
    }
}
