//! Live-update WebSocket channel

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};

use super::server::ServerState;
use crate::broadcast::BroadcastHub;

/// Route: GET /ws
pub async fn live_updates(State(state): State<ServerState>, ws: WebSocketUpgrade) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_client(socket, hub))
}

/// Forward hub payloads to one client until either side goes away
///
/// Client frames are read only to notice Close or a dropped connection.
async fn handle_client(mut socket: WebSocket, hub: BroadcastHub) {
    let mut subscription = hub.register();
    let id = subscription.id;
    tracing::info!("Live client {} connected ({} total)", id, hub.client_count());

    loop {
        tokio::select! {
            payload = subscription.recv() => match payload {
                Some(payload) => {
                    if socket.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                None => {
                    // Reaped by the hub or shutting down
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            },

            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    hub.unregister(&id);
    tracing::info!("Live client {} disconnected", id);
}
