//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{ClientId, RegistryError},
    infrastructure::dto::envelope::encode_reply_or_marker,
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the client's outbound queue into its socket.
/// Every frame goes out as a binary message.
///
/// The queue's only sender lives in the connection registry, so the task
/// ends once the client is unregistered or the socket stops accepting
/// writes.
fn pusher_loop(
    client_id: ClientId,
    mut rx: mpsc::Receiver<Bytes>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = sender.send(Message::Binary(frame)).await {
                tracing::debug!("Write to '{}' failed: {}", client_id, e);
                break;
            }
        }
        let _ = sender.close().await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::channel(state.outbound_queue.max(1));
    let connected = state.connect_client_usecase.execute(tx).await;
    let client_id = connected.client_id;

    // The greeting goes out before anything queued for this client
    for reply in &connected.greeting {
        if let Err(e) = sender.send(Message::Binary(encode_reply_or_marker(reply))).await {
            tracing::error!("Failed to greet '{}': {}", client_id, e);
            state.disconnect_client_usecase.execute(client_id).await;
            return;
        }
    }

    let recv_state = state.clone();

    // Spawn a task to route envelopes from this client, one at a time
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let frame = match msg {
                Ok(Message::Text(text)) => Bytes::copy_from_slice(text.as_str().as_bytes()),
                Ok(Message::Binary(data)) => data,
                Ok(Message::Close(_)) => {
                    tracing::info!("Client '{}' requested close", client_id);
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!("WebSocket error for '{}': {}", client_id, e);
                    break;
                }
            };

            let reply = recv_state
                .route_envelope_usecase
                .execute(client_id, frame)
                .await;
            match recv_state
                .registry
                .send(&client_id, encode_reply_or_marker(&reply))
                .await
            {
                Ok(()) => {}
                Err(RegistryError::QueueFull(_)) => {
                    tracing::warn!("Dropped reply to lagging client '{}'", client_id);
                }
                Err(e) => {
                    tracing::info!("Stopped reading from '{}': {}", client_id, e);
                    break;
                }
            }
        }
    });

    // Spawn a task to push queued frames to this client
    let send_task = pusher_loop(client_id, rx, sender);

    // No routing step may land after the cleanup below
    join_first(recv_task, send_task).await;

    state.disconnect_client_usecase.execute(client_id).await;
}

/// Waits for whichever task completes first, then aborts the other and waits
/// until it has stopped.
async fn join_first(mut recv_task: JoinHandle<()>, mut send_task: JoinHandle<()>) {
    tokio::select! {
        _ = &mut recv_task => {
            send_task.abort();
            let _ = send_task.await;
        }
        _ = &mut send_task => {
            recv_task.abort();
            let _ = recv_task.await;
        }
    };
}
