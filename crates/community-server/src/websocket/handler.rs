//! WebSocket connection handler

use crate::auth::extractor::authenticate;
use crate::models::WsEvent;
use crate::state::AppState;
use crate::websocket::events::WsConnection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Keepalive cadence for idle connections
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Access token; the browser WebSocket API cannot set headers
    pub token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
) -> Response {
    let token = match query.token {
        Some(ref t) => t,
        None => {
            warn!("WebSocket connection rejected: missing token");
            return (StatusCode::UNAUTHORIZED, "Missing token").into_response();
        }
    };

    let user = match authenticate(&state, token) {
        Ok(u) => u,
        Err(e) => {
            warn!("WebSocket connection rejected: {}", e);
            return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
        }
    };

    let conn_id = Uuid::new_v4();
    let user_id = user.user_id;
    ws.on_upgrade(move |socket| handle_socket(socket, state, conn_id, user_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, conn_id: Uuid, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();

    state.broadcaster.add_connection(WsConnection {
        id: conn_id,
        user_id,
    });
    info!("WebSocket connected: {} (user: {})", conn_id, user_id);

    let mut event_rx = state.broadcaster.subscribe();

    let send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        // The first tick fires immediately; consume it so pings start
        // one interval after connect.
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    let msg = match serde_json::to_string(&WsEvent::Ping) {
                        Ok(json) => json,
                        Err(_) => continue,
                    };
                    if sender.send(Message::Text(msg)).await.is_err() {
                        break;
                    }
                }
                result = event_rx.recv() => match result {
                    Ok(event) => {
                        // Notification events go only to their target user
                        if let Some(target) = event.target_user() {
                            if target != user_id {
                                continue;
                            }
                        }

                        let msg = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                error!("Failed to serialize event: {}", e);
                                continue;
                            }
                        };

                        if sender.send(Message::Text(msg)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!("WebSocket {} lagged by {} messages", conn_id, n);
                    }
                    Err(RecvError::Closed) => {
                        break;
                    }
                },
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    handle_client_message(conn_id, &text);
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    debug!("Received ping/pong from {}", conn_id);
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket {} closed by client", conn_id);
                    break;
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", conn_id, e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.broadcaster.remove_connection(&conn_id);
    info!("WebSocket disconnected: {}", conn_id);
}

fn handle_client_message(conn_id: Uuid, text: &str) {
    match serde_json::from_str::<WsEvent>(text) {
        Ok(WsEvent::Ping) => {
            debug!("Received ping from {}", conn_id);
        }
        Ok(_) => {
            debug!("Received event from {}: {}", conn_id, text);
        }
        Err(e) => {
            warn!("Invalid message from {}: {} - {}", conn_id, text, e);
        }
    }
}
