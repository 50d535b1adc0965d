use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::post::PostResponse;

/// What happened to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedAction {
    Created,
    Updated,
    Deleted,
}

/// A post lifecycle event fanned out to feed subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEvent {
    pub action: FeedAction,
    pub post: PostResponse,
}

/// Broadcast fan-out of feed events to websocket subscribers.
///
/// Publishing is best-effort: no subscribers is a no-op, and a slow or gone
/// subscriber can never fail the write path that produced the event.
#[derive(Clone)]
pub struct FeedNotifier {
    tx: broadcast::Sender<FeedEvent>,
}

impl FeedNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: FeedEvent) {
        // Err means nobody is listening right now.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }
}
