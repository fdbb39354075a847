//! Live update bus: broadcasts change events to SSE subscribers.
//!
//! Replaces the hosted backend's query-snapshot subscriptions. Slow
//! subscribers lag and miss events (broadcast semantics); they are
//! expected to re-list via the REST endpoints.

use tokio::sync::broadcast;

use crate::models::event::ChangeEvent;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventsService {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for EventsService {
    fn default() -> Self {
        Self::new()
    }
}

impl EventsService {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish a change event. A send error only means nobody is
    /// listening right now.
    pub fn publish(&self, event: ChangeEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::trace!(?event, "no live subscribers");
        }
    }

    /// Subscribe to the change stream
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{Action, Entity};

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let events = EventsService::new();
        let mut rx = events.subscribe();

        events.publish(ChangeEvent::new(Entity::Books, Action::Created, 7));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.entity, Entity::Books);
        assert_eq!(event.action, Action::Created);
        assert_eq!(event.id, Some(7));
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let events = EventsService::new();
        events.publish(ChangeEvent::denied(Entity::Users));
        assert_eq!(events.subscriber_count(), 0);
    }
}
