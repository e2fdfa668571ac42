use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Broadcast hub fanning engine events out to SSE subscribers.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a hub backed by a Tokio broadcast channel of the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a subscriber that receives subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to current subscribers; nobody listening is not an error.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events_sent_after_subscribing() {
        let hub = SseHub::new(4);
        hub.broadcast(ServerEvent::new(Some("ignored".to_string()), "early".into()));

        let mut receiver = hub.subscribe();
        hub.broadcast(ServerEvent::new(Some("info".to_string()), "hello".into()));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("info"));
        assert_eq!(event.data, "hello");
    }
}
