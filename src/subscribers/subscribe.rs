//! # Subscriber contract
//!
//! A [`Subscribe`] implementation receives every service [`Event`] it
//! [`accepts`](Subscribe::accepts) on its own worker, fed by a bounded queue owned by
//! the [`SubscriberSet`](crate::SubscriberSet). A slow subscriber only loses its own
//! events (reported as `SubscriberOverflow`); report handlers never wait for it.

use async_trait::async_trait;

use crate::events::Event;

#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Runs on the subscriber's worker; a panic is caught and
    /// reported as `SubscriberPanicked`.
    async fn on_event(&self, event: &Event);

    /// Filter evaluated on the publishing side; rejected events never enter the queue.
    fn accepts(&self, _event: &Event) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (min 1).
    fn queue_capacity(&self) -> usize {
        256
    }
}
