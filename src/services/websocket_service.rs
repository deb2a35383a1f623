//! WebSocket transport adapter: connection lifecycle for participant sockets
//! and fan-out broadcasts. All protocol decisions live in
//! [`session_service`](crate::services::session_service); this module only
//! moves frames.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        game::GameStateDto,
        ws::{ClientMessage, ServerMessage},
    },
    services::session_service,
    state::{PlayerConnection, SharedState},
};

/// Handle the full lifecycle of one authenticated participant socket.
///
/// The session token has already been validated against the registry by the
/// upgrade handler. A reconnect on the same token replaces the previous
/// connection entry; the stale socket's writer just drains and dies.
pub async fn handle_socket(state: SharedState, socket: WebSocket, token: String) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let connection_id = Uuid::new_v4();
    state.connections().insert(
        token.clone(),
        PlayerConnection {
            id: connection_id,
            tx: outbound_tx.clone(),
        },
    );
    info!(connection = %connection_id, "participant connected");

    match session_service::connect_messages(&state, &token).await {
        Ok(messages) => {
            if send_messages(&outbound_tx, &messages).is_err() {
                remove_connection(&state, &token, connection_id);
                finalize(writer_task, outbound_tx).await;
                return;
            }
        }
        Err(err) => {
            warn!(error = %err, "rejecting socket during initial sync");
            let _ = outbound_tx.send(Message::Close(None));
            remove_connection(&state, &token, connection_id);
            finalize(writer_task, outbound_tx).await;
            return;
        }
    }

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let parsed = match ClientMessage::from_json_str(&text) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        warn!(error = %err, "failed to parse client message");
                        continue;
                    }
                };

                let result = match parsed {
                    ClientMessage::Answer { answer } => {
                        session_service::answer_messages(&state, &token, &answer).await
                    }
                    ClientMessage::Finish => {
                        session_service::finish_messages(&state, &token).await
                    }
                    ClientMessage::Sync => session_service::sync_messages(&state, &token).await,
                    ClientMessage::Unknown => {
                        debug!("ignoring unknown client message type");
                        continue;
                    }
                };

                match result {
                    Ok(messages) => {
                        if send_messages(&outbound_tx, &messages).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "error while handling client message");
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(connection = %connection_id, "participant closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(connection = %connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    remove_connection(&state, &token, connection_id);
    info!(connection = %connection_id, "participant disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Push the current game state to every connected participant.
pub async fn broadcast_game_state(state: &SharedState) {
    let game = state.game_state().await;
    let message = ServerMessage::GameState(GameStateDto::from(&game));
    broadcast(state, &message);
}

/// Tell every connected participant that its session no longer exists, then
/// drop all connection entries.
pub async fn broadcast_session_invalidated(state: &SharedState) {
    broadcast(state, &ServerMessage::SessionInvalidated);
    for entry in state.connections().iter() {
        let _ = entry.value().tx.send(Message::Close(None));
    }
    state.connections().clear();
}

fn broadcast(state: &SharedState, message: &ServerMessage) {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize broadcast message");
            return;
        }
    };

    let mut dead = Vec::new();
    for entry in state.connections().iter() {
        if entry
            .value()
            .tx
            .send(Message::Text(payload.clone().into()))
            .is_err()
        {
            dead.push(entry.key().clone());
        }
    }
    for token in dead {
        state.connections().remove(&token);
    }
}

/// Serialize and queue each message in order; stops at the first writer
/// failure since the connection is gone.
fn send_messages(
    tx: &mpsc::UnboundedSender<Message>,
    messages: &[ServerMessage],
) -> Result<(), ()> {
    for message in messages {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to serialize server message");
                continue;
            }
        };
        tx.send(Message::Text(payload.into())).map_err(|_| ())?;
    }
    Ok(())
}

/// Drop the registry entry only if it still belongs to this connection; a
/// reconnect may already have replaced it.
fn remove_connection(state: &SharedState, token: &str, connection_id: Uuid) {
    state
        .connections()
        .remove_if(token, |_, connection| connection.id == connection_id);
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
