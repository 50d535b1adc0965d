use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::broadcast;
use tracing::instrument;

use crate::notify::FeedEvent;
use crate::state::AppState;

/// Upgrade to a websocket that streams post lifecycle events as JSON frames.
#[instrument(skip(state, ws))]
pub async fn feed_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let rx = state.feed.subscribe();
    ws.on_upgrade(move |socket| stream_events(socket, rx))
}

async fn stream_events(mut socket: WebSocket, mut rx: broadcast::Receiver<FeedEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let Ok(text) = serde_json::to_string(&event) else {
                    continue;
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    // Subscriber hung up.
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "feed subscriber lagged, events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
