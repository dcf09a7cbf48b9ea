//! WebSocket handler for real-time room play.
//!
//! # Connection flow
//!
//! 1. Client connects via `GET /ws`.
//! 2. The first text message must be `{"action": "join-room", "name": ...}`;
//!    the registry seats the player in the first open room, creating one
//!    if needed.
//! 3. Every later text message is one typed game action. The caller gets
//!    a success or error response on its own socket; accepted actions
//!    additionally fan the full room snapshot out to every member as
//!    `joined-room` / `update-game-state` / `dice-rolled` /
//!    `knight-rolled` events. Rejected actions broadcast nothing.
//! 4. On disconnect the seat is vacated, which also dissolves any
//!    interrupt the player still owed the room.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use settlers::game::{Action, entities::PlayerId};
use settlers::room::ServerEvent;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{AppState, rate_limiter::RateLimiter};

/// The mandatory first message on a fresh socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
enum HelloMessage {
    JoinRoom {
        /// Opaque identity; a fresh uuid is minted when absent.
        identity: Option<String>,
        name: String,
    },
}

/// Per-caller command responses, distinct from the broadcast events.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerResponse {
    Success { message: String },
    Error { message: String },
}

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Wait for the join-room handshake.
    let hello = loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<HelloMessage>(&text) {
                Ok(hello) => break hello,
                Err(e) => {
                    warn!("websocket handshake failed to parse: {e}");
                    send_response(
                        &mut sender,
                        &ServerResponse::Error {
                            message: "expected a join-room message first".to_string(),
                        },
                    )
                    .await;
                    return;
                }
            },
            Some(Ok(Message::Close(_))) | None => return,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                error!("websocket error before join: {e}");
                return;
            }
        }
    };

    let HelloMessage::JoinRoom { identity, name } = hello;
    let player = PlayerId::new(identity.unwrap_or_else(|| Uuid::new_v4().to_string()));

    let (event_tx, mut event_rx) = mpsc::channel::<ServerEvent>(64);
    let (room, joined) = match state
        .registry
        .join_room(player.clone(), name.clone(), event_tx)
        .await
    {
        Ok(joined) => joined,
        Err(e) => {
            warn!("join failed for {name}: {e}");
            send_response(
                &mut sender,
                &ServerResponse::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };
    let room_id = joined.room_id;
    info!("websocket connected: room={room_id}, player={player}");

    // Responses from the receive loop are funneled through a channel so
    // the single sender half can interleave them with broadcasts.
    let (response_tx, mut response_rx) = mpsc::channel::<String>(32);

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                maybe_event = event_rx.recv() => {
                    let Some(event) = maybe_event else { break };
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            error!("failed to serialize broadcast: {e}");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                maybe_response = response_rx.recv() => {
                    let Some(json) = maybe_response else { break };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut burst_limiter = RateLimiter::burst();
    let mut sustained_limiter = RateLimiter::sustained();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if !burst_limiter.check() || !sustained_limiter.check() {
                    warn!("rate limit exceeded for {player} in room {room_id}");
                    let throttled = ServerResponse::Error {
                        message: "rate limit exceeded, slow down".to_string(),
                    };
                    if let Ok(json) = serde_json::to_string(&throttled) {
                        let _ = response_tx.send(json).await;
                    }
                    continue;
                }

                let response = match serde_json::from_str::<Action>(&text) {
                    Ok(action) => match room.act(player.clone(), action).await {
                        Ok(Ok(_outcome)) => ServerResponse::Success {
                            message: "action accepted".to_string(),
                        },
                        Ok(Err(rejection)) => ServerResponse::Error {
                            message: rejection.to_string(),
                        },
                        Err(gone) => ServerResponse::Error {
                            message: gone.to_string(),
                        },
                    },
                    Err(e) => {
                        warn!("unparseable action from {player}: {e}");
                        ServerResponse::Error {
                            message: "invalid or out-of-place action".to_string(),
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
                info!("websocket closed: room={room_id}, player={player}");
                break;
            }
            Err(e) => {
                error!("websocket error: {e}");
                break;
            }
            _ => {}
        }
    }

    // Vacate the seat so the room never waits on a ghost; the registry
    // tears the room down if this was the last player.
    send_task.abort();
    if let Err(e) = state.registry.leave_room(room_id, player.clone()).await {
        warn!("leave after disconnect failed for {player}: {e}");
    }
    info!("websocket disconnected: room={room_id}, player={player}");
}

async fn send_response(sender: &mut SplitSink<WebSocket, Message>, response: &ServerResponse) {
    if let Ok(json) = serde_json::to_string(response) {
        let _ = sender.send(Message::Text(json.into())).await;
    }
}
