//! # Outbound notices and the dispatcher seam.
//!
//! The service never talks to sockets. Every outbound message is a [`Notice`] handed to
//! a [`Dispatch`] implementation together with the station whose group should receive
//! it. The transport owns groups, connections and delivery.
//!
//! ## Rules
//! - `emit` is awaited **after** the `LotState` guard is released
//! - Notices are not retried; a station that missed one resyncs from the
//!   `parking_lot_state` it receives on (re)connect
//!
//! ## Wire names
//! ```text
//! Notice::CloseParkingLot   → "close_parking_lot"
//! Notice::OpenParkingLot    → "open_parking_lot"
//! Notice::CloseFloor        → "close_floor"
//! Notice::OpenFloor         → "open_floor"
//! Notice::ParkingLotState   → "parking_lot_state"
//! ```

use async_trait::async_trait;
use serde::Serialize;

use crate::stations::{ConnectionId, StationIdentity};

pub const CLOSE_PARKING_LOT_EVENT: &str = "close_parking_lot";
pub const OPEN_PARKING_LOT_EVENT: &str = "open_parking_lot";
pub const CLOSE_FLOOR_EVENT: &str = "close_floor";
pub const OPEN_FLOOR_EVENT: &str = "open_floor";
pub const PARKING_LOT_STATE_EVENT: &str = "parking_lot_state";

/// Resync payload sent to a station on (re)connect and after a reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationState {
    pub station: StationIdentity,
    pub floor: usize,
    /// Occupancy per space in slot order (`true` = occupied).
    pub spaces: Vec<bool>,
    pub floor_full: bool,
    /// Floor closed by order.
    pub floor_closed: bool,
    pub lot_full: bool,
    /// Facility closed by order.
    pub lot_closed: bool,
}

/// Message addressed to one station's group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Notice {
    CloseParkingLot,
    OpenParkingLot,
    CloseFloor,
    OpenFloor,
    ParkingLotState(StationState),
}

impl Notice {
    /// Event name on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            Notice::CloseParkingLot => CLOSE_PARKING_LOT_EVENT,
            Notice::OpenParkingLot => OPEN_PARKING_LOT_EVENT,
            Notice::CloseFloor => CLOSE_FLOOR_EVENT,
            Notice::OpenFloor => OPEN_FLOOR_EVENT,
            Notice::ParkingLotState(_) => PARKING_LOT_STATE_EVENT,
        }
    }
}

/// Delivery of notices to station groups.
///
/// Implemented by the transport layer (see [`Rooms`](crate::transport::Rooms)).
#[async_trait]
pub trait Dispatch: Send + Sync + 'static {
    /// Delivers `notice` to every connection in `target`'s group.
    async fn emit(&self, target: StationIdentity, notice: Notice);

    /// Disconnects a connection that was superseded by a newer one for the same station.
    async fn evict(&self, _conn: &ConnectionId) {}

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Dispatcher that drops every notice; used when none is configured.
#[derive(Debug, Default)]
pub struct NullDispatch;

#[async_trait]
impl Dispatch for NullDispatch {
    async fn emit(&self, _target: StationIdentity, _notice: Notice) {}

    fn name(&self) -> &'static str {
        "null"
    }
}
