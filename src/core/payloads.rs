//! Inbound payloads and handler results.

use serde::{Deserialize, Serialize};

use crate::lot::CarRecord;
use crate::policies::{Decision, Fee};
use crate::stations::{ConnectionId, StationIdentity};

use super::dispatch::StationState;

/// Body of `car_arrived` and `car_departed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceReport {
    pub parking_space: i64,
    pub timestamp: i64,
}

impl SpaceReport {
    pub fn new(parking_space: i64, timestamp: i64) -> Self {
        Self {
            parking_space,
            timestamp,
        }
    }
}

/// Body of `order_to_close_floor` / `order_to_open_floor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorOrder {
    pub client_id: String,
}

/// Outcome of a successful connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
    pub station: StationIdentity,
    /// Resync payload for the joining station.
    pub state: StationState,
    /// Connection that was bound to the same station before this one.
    pub superseded: Option<ConnectionId>,
}

/// Outcome of a successful arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    pub station: StationIdentity,
    pub car: CarRecord,
    pub decision: Decision,
}

/// Outcome of a successful departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    pub station: StationIdentity,
    pub car: CarRecord,
    pub fee: Fee,
    pub decision: Decision,
}
