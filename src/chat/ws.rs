//! WebSocket shell: live transcript updates and chat actions.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::routes::ChatRouteState;
use super::service::{ChatEvent, ChatService};

/// Message from client → server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Start,
    Answer { text: String },
    Reset,
    Complete,
}

pub(super) async fn ws_chat_handler(
    ws: WebSocketUpgrade,
    State(state): State<ChatRouteState>,
) -> impl IntoResponse {
    info!("Chat client connecting");
    ws.on_upgrade(|socket| handle_chat_socket(socket, state.chat))
}

async fn send_event(socket: &mut WebSocket, event: &ChatEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize chat event");
            true
        }
    }
}

async fn handle_chat_socket(mut socket: WebSocket, chat: Arc<ChatService>) {
    info!("Chat client connected");

    // Subscribe before the sync so nothing falls between the two.
    let mut rx = chat.subscribe();

    let sync = ChatEvent::SessionSync {
        session: chat.snapshot().await,
    };
    if !send_event(&mut socket, &sync).await {
        warn!("Failed to send initial sync, client disconnected");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await {
                            debug!("Chat client disconnected during send");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "Chat client lagged behind broadcast");
                        let sync = ChatEvent::SessionSync {
                            session: chat.snapshot().await,
                        };
                        if !send_event(&mut socket, &sync).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Chat broadcast channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => {
                                if let Some(error) = handle_client_message(&chat, msg).await {
                                    if !send_event(&mut socket, &error).await {
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                debug!(error = %e, text = %text, "Invalid JSON from chat client");
                                let error = ChatEvent::Error {
                                    message: format!("invalid message: {e}"),
                                };
                                if !send_event(&mut socket, &error).await {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Chat client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Chat WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("Chat connection closed");
}

/// Apply a client action. Results reach the client through the broadcast;
/// only failures are returned for a direct reply.
async fn handle_client_message(
    chat: &Arc<ChatService>,
    msg: ClientMessage,
) -> Option<ChatEvent> {
    let result = match msg {
        ClientMessage::Start => {
            chat.start().await;
            Ok(())
        }
        ClientMessage::Answer { text } => chat
            .answer(&text)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
        ClientMessage::Reset => {
            chat.reset().await;
            Ok(())
        }
        ClientMessage::Complete => chat
            .complete()
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
    };

    result.err().map(|message| ChatEvent::Error { message })
}
