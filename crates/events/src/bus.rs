//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Data endpoints publish one [`QueryEvent`] per served query, whether the
//! response came from the cache or was freshly computed. The webhook invoker
//! subscribes and does the counting off the request path.

use chrono::Utc;
use renewables_core::renewables::YearRange;
use renewables_core::types::{IsoCode, Timestamp};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// QueryEvent
// ---------------------------------------------------------------------------

/// Scope of a served data query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEvent {
    /// ISO codes the response covered. Empty means every country.
    pub countries: Vec<IsoCode>,
    pub range: YearRange,
    pub timestamp: Timestamp,
}

impl QueryEvent {
    pub fn new(countries: Vec<IsoCode>, range: YearRange) -> Self {
        Self {
            countries,
            range,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest un-consumed events are dropped and
/// slow receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<QueryEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Dropped silently when nobody is subscribed.
    pub fn publish(&self, event: QueryEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(QueryEvent::new(vec!["NOR".into()], YearRange::current()));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.countries, vec!["NOR".to_string()]);
        assert_eq!(event.range, YearRange::current());
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        EventBus::new(4).publish(QueryEvent::new(vec![], YearRange::current()));
    }

    #[tokio::test]
    async fn dropping_the_bus_closes_receivers() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        drop(bus);
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
