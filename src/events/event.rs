//! # Runtime events emitted by the lot service.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Connection events**: station connect, eviction, disconnect, rejection
//! - **Occupancy events**: car parked / departed, report rejected, reset
//! - **Transition events**: floor or lot closed / opened (automatic or ordered)
//! - **Runtime events**: subscriber failures, shutdown
//!
//! The [`Event`] struct carries additional metadata such as the station, connection,
//! floor, space, car and fee involved.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use lotvisor::{Event, EventKind, StationIdentity};
//!
//! let ev = Event::new(EventKind::CarParked)
//!     .with_station(StationIdentity::First)
//!     .with_space(3)
//!     .with_car(17);
//!
//! assert_eq!(ev.kind, EventKind::CarParked);
//! assert_eq!(ev.floor, Some(1));
//! assert_eq!(ev.car, Some(17));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::policies::Fee;
use crate::stations::{ConnectionId, StationIdentity};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Connection events ===
    /// A connection was bound to a station.
    ///
    /// Sets: `station`, `connection`
    StationConnected,

    /// A connection was superseded by a newer connect for the same station.
    ///
    /// Sets: `station`, `connection` (the evicted handle)
    StationEvicted,

    /// A bound connection went away.
    ///
    /// Sets: `station`, `connection`
    StationDisconnected,

    /// A connect carried a missing or unknown identity.
    ///
    /// Sets: `connection`, `reason`
    ConnectionRejected,

    // === Occupancy events ===
    /// A car was parked.
    ///
    /// Sets: `station`, `floor`, `space`, `car`, `connection`
    CarParked,

    /// A car left; its fee has been computed.
    ///
    /// Sets: `station`, `floor`, `space`, `car`, `fee`, `connection`
    CarDeparted,

    /// A report or order was rejected.
    ///
    /// Sets: `reason` (label + message), optionally `station`, `connection`, `space`
    ReportRejected,

    /// Every space was emptied by a reset order.
    ///
    /// Sets: `reason` (number of cars dropped)
    LotReset,

    // === Transition events ===
    /// A floor became full, or was ordered closed.
    ///
    /// Sets: `station`, `floor`, `reason` ("full" / "ordered")
    FloorClosed,

    /// A floor stopped being full, or was ordered open.
    ///
    /// Sets: `station`, `floor`, `reason`
    FloorOpened,

    /// The facility became full, or was ordered closed.
    ///
    /// Sets: `station` (addressee), `reason`
    LotClosed,

    /// The facility stopped being full, or was ordered open.
    ///
    /// Sets: `station` (addressee), `reason`
    LotOpened,

    // === Runtime events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (subscriber name and panic message)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason`
    SubscriberOverflow,

    /// Shutdown requested (OS signal observed).
    ShutdownRequested,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Station involved (reporter or addressee).
    pub station: Option<StationIdentity>,
    /// Transport handle involved.
    pub connection: Option<ConnectionId>,
    /// Floor index.
    pub floor: Option<usize>,
    /// Space number as reported.
    pub space: Option<i64>,
    /// Car id.
    pub car: Option<u64>,
    /// Departure fee.
    pub fee: Option<Fee>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            station: None,
            connection: None,
            floor: None,
            space: None,
            car: None,
            fee: None,
            reason: None,
        }
    }

    /// Attaches a station; also sets `floor` to the station's floor.
    #[inline]
    pub fn with_station(mut self, station: StationIdentity) -> Self {
        self.station = Some(station);
        self.floor = Some(station.floor());
        self
    }

    #[inline]
    pub fn with_connection(mut self, conn: &ConnectionId) -> Self {
        self.connection = Some(conn.clone());
        self
    }

    #[inline]
    pub fn with_space(mut self, space: i64) -> Self {
        self.space = Some(space);
        self
    }

    #[inline]
    pub fn with_car(mut self, id: u64) -> Self {
        self.car = Some(id);
        self
    }

    #[inline]
    pub fn with_fee(mut self, fee: Fee) -> Self {
        self.fee = Some(fee);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::CarParked);
        let b = Event::new(EventKind::CarDeparted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders() {
        let conn = ConnectionId::from("c9");
        let ev = Event::new(EventKind::CarDeparted)
            .with_station(StationIdentity::Second)
            .with_connection(&conn)
            .with_space(7)
            .with_car(3)
            .with_fee(Fee::from_hundredths(20));

        assert_eq!(ev.floor, Some(2));
        assert_eq!(ev.connection.as_ref(), Some(&conn));
        assert_eq!(ev.fee.map(|f| f.hundredths()), Some(20));
        assert!(ev.reason.is_none());

        let ev = Event::subscriber_overflow("log", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.reason.as_deref(), Some("subscriber=log reason=full"));
    }
}
