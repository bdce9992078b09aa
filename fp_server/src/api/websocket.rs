//! WebSocket handler for real-time game updates.
//!
//! Each connection subscribes to one game's change feed. Whenever anything
//! in the game changes - a join, a bet, a phase advance, a resolution - the
//! connection pushes a fresh redacted snapshot, so clients render from the
//! latest state instead of patching deltas. A burst of changes collapses
//! into a single push.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/{game_id}?session=<token>`
//! 2. Server subscribes to the game's change feed (404 if the game is
//!    unknown) and upgrades the connection
//! 3. An opening snapshot goes out immediately; further snapshots follow
//!    the feed
//! 4. On disconnect the subscription is dropped
//!
//! # Client Messages
//!
//! The feed is read-mostly; mutations go through the HTTP API. The only
//! client message is a liveness probe:
//!
//! ```json
//! {"type": "ping"}
//! ```
//!
//! answered with `{"type": "pong"}`.
//!
//! # Server Messages
//!
//! Snapshots are tagged the same way:
//!
//! ```json
//! {"type": "game_state", "game": {...}, "players": [...], "question": {...}}
//! ```

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use fermi_poker::{
    Change, GameView,
    entities::{GameId, SessionId},
};

use super::{AppState, map_game_error};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Resolves the viewer for redaction; absent means spectator view.
    session: Option<String>,
}

/// Client messages received via WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Liveness probe.
    Ping,
}

/// Messages pushed to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    /// Full redacted snapshot, sent on connect and after every change.
    GameState(GameView),
    Pong,
    Error { message: String },
}

/// Upgrade HTTP connection to WebSocket for a game's state feed.
///
/// Subscribing happens before the upgrade so an unknown game id comes back
/// as a plain `404` instead of a connection that opens and immediately
/// closes.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(game_id): Path<GameId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let (subscriber_id, changes) = match state.manager.subscribe(game_id).await {
        Ok(subscription) => subscription,
        Err(err) => return map_game_error(err).into_response(),
    };

    let session = query.session.map(|token| SessionId::new(&token));
    ws.on_upgrade(move |socket| {
        handle_socket(socket, game_id, session, subscriber_id, changes, state)
    })
}

/// Handle an established WebSocket connection.
///
/// Splits the socket into a send task driven by the change feed and a
/// receive loop that answers pings. Either side closing tears both down
/// and unsubscribes from the game.
async fn handle_socket(
    socket: WebSocket,
    game_id: GameId,
    session: Option<SessionId>,
    subscriber_id: u64,
    mut changes: mpsc::Receiver<Change>,
    state: AppState,
) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket connected: game={game_id}, subscriber={subscriber_id}");
    metrics::websocket_connection_opened();

    // Channel for responses produced by the receive loop.
    let (response_tx, mut response_rx) = mpsc::channel::<String>(32);

    let send_state = state.clone();
    let send_task = tokio::spawn(async move {
        // Opening snapshot so the client renders before anything changes.
        match snapshot(&send_state, game_id, session.as_ref()).await {
            Some(json) => {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    return;
                }
            }
            None => return,
        }

        loop {
            tokio::select! {
                maybe_change = changes.recv() => {
                    if maybe_change.is_none() {
                        // Feed closed: the game actor is gone.
                        break;
                    }
                    // Collapse a burst of changes into one snapshot.
                    while changes.try_recv().is_ok() {}

                    match snapshot(&send_state, game_id, session.as_ref()).await {
                        Some(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                Some(response_json) = response_rx.recv() => {
                    if sender.send(Message::Text(response_json.into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Receive loop: answer pings, flag anything else.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Ping) => ServerMessage::Pong,
                    Err(err) => {
                        debug!("unparseable client message: {err}");
                        ServerMessage::Error {
                            message: "Invalid message format".to_string(),
                        }
                    }
                };
                if let Ok(json) = serde_json::to_string(&response)
                    && response_tx.send(json).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: game={game_id}, subscriber={subscriber_id}");
                break;
            }
            Err(err) => {
                warn!("WebSocket error: {err}");
                break;
            }
            _ => {}
        }
    }

    // Cleanup: stop pushing, then let the actor prune the subscription.
    send_task.abort();
    state.manager.unsubscribe(game_id, subscriber_id).await;
    metrics::websocket_connection_closed();

    info!("WebSocket disconnected: game={game_id}, subscriber={subscriber_id}");
}

/// Serialized snapshot for the viewer, or `None` when the game is gone or
/// the view will not serialize (both end the connection).
async fn snapshot(state: &AppState, game_id: GameId, session: Option<&SessionId>) -> Option<String> {
    let view = match state.manager.game_view(game_id, session.cloned()).await {
        Ok(view) => view,
        Err(err) => {
            warn!("game {game_id} view unavailable: {err}");
            return None;
        }
    };
    match serde_json::to_string(&ServerMessage::GameState(view)) {
        Ok(json) => Some(json),
        Err(err) => {
            warn!("failed to serialize game view: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Wire Format Tests
    // ============================================================================

    #[test]
    fn test_ping_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_unknown_client_message_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "bet"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[test]
    fn test_pong_wire_shape() {
        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }

    #[tokio::test]
    async fn test_game_state_wire_shape() {
        let state = AppState::new(fermi_poker::GameSettings::default());
        let game = state.manager.create_game(false).await;
        let view = state.manager.game_view(game.id, None).await.unwrap();

        let value = serde_json::to_value(ServerMessage::GameState(view)).unwrap();
        assert_eq!(value["type"], "game_state");
        assert_eq!(value["game"]["id"], game.id);
        assert!(value["players"].as_array().unwrap().is_empty());
    }
}
