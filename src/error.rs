//! Error types used by the occupancy core and the report handlers.
//!
//! This module defines two main error enums:
//!
//! - [`LotError`] — failures of slot/floor/lot mutations (bad index, slot conflict).
//! - [`ReportError`] — failures of an inbound station report, wrapping [`LotError`].
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging and for the
//! `error` frames written back to the offending connection.

use thiserror::Error;

/// # Errors produced by the occupancy hierarchy.
///
/// Every variant leaves the state untouched: the guard is held for the whole mutation,
/// so a failed slot-level operation is never partially observed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LotError {
    /// Floor number outside `[0, FLOORS)`.
    #[error("invalid floor index {floor}")]
    InvalidFloorIndex {
        /// The rejected floor number, as reported.
        floor: i64,
    },

    /// Space number outside `[0, SPACES_PER_FLOOR)`.
    #[error("invalid space index {space}")]
    InvalidSpaceIndex {
        /// The rejected space number, as reported.
        space: i64,
    },

    /// A car was reported arriving on a space that is already taken.
    #[error("parking space is already occupied by car {occupant}")]
    AlreadyOccupied {
        /// Id of the car currently on the space.
        occupant: u64,
    },

    /// A car was reported leaving a space that is already empty.
    #[error("parking space is already empty")]
    AlreadyEmpty,
}

impl LotError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use lotvisor::LotError;
    ///
    /// let err = LotError::AlreadyEmpty;
    /// assert_eq!(err.as_label(), "slot_already_empty");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LotError::InvalidFloorIndex { .. } => "invalid_floor_index",
            LotError::InvalidSpaceIndex { .. } => "invalid_space_index",
            LotError::AlreadyOccupied { .. } => "slot_already_occupied",
            LotError::AlreadyEmpty => "slot_already_empty",
        }
    }

    /// True for out-of-range floor or space numbers.
    ///
    /// # Example
    /// ```
    /// use lotvisor::LotError;
    ///
    /// assert!(LotError::InvalidFloorIndex { floor: -1 }.is_invalid_index());
    /// assert!(!LotError::AlreadyEmpty.is_invalid_index());
    /// ```
    pub fn is_invalid_index(&self) -> bool {
        matches!(
            self,
            LotError::InvalidFloorIndex { .. } | LotError::InvalidSpaceIndex { .. }
        )
    }

    /// True when the station reported a state inconsistent with the slot.
    ///
    /// # Example
    /// ```
    /// use lotvisor::LotError;
    ///
    /// assert!(LotError::AlreadyOccupied { occupant: 7 }.is_slot_conflict());
    /// assert!(!LotError::InvalidSpaceIndex { space: 9 }.is_slot_conflict());
    /// ```
    pub fn is_slot_conflict(&self) -> bool {
        matches!(
            self,
            LotError::AlreadyOccupied { .. } | LotError::AlreadyEmpty
        )
    }
}

/// # Errors produced while handling a station report or order.
///
/// These are protocol errors: they are reported to the offending connection and
/// published on the bus, never retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The mutation itself was rejected by the occupancy hierarchy.
    #[error(transparent)]
    Lot(#[from] LotError),

    /// The report came from a connection that is not bound to any station.
    #[error("connection {connection} is not bound to a station")]
    UnknownIdentity {
        /// The unbound connection handle.
        connection: String,
    },

    /// Connect (or order) with a missing or unrecognized station identity.
    #[error("unrecognized station identity {value:?}")]
    InvalidIdentityHeader {
        /// Raw value received, `None` when the header was missing.
        value: Option<String>,
    },

    /// Departure timestamp lies before the arrival timestamp.
    #[error("departure at {departed_at} precedes arrival at {arrived_at}")]
    InvalidInterval {
        /// Arrival timestamp (seconds).
        arrived_at: i64,
        /// Departure timestamp (seconds).
        departed_at: i64,
    },
}

impl ReportError {
    /// Returns a short stable label (snake_case) for use in logs and error frames.
    ///
    /// # Example
    /// ```
    /// use lotvisor::{LotError, ReportError};
    ///
    /// let err = ReportError::from(LotError::InvalidFloorIndex { floor: 4 });
    /// assert_eq!(err.as_label(), "invalid_floor_index");
    ///
    /// let err = ReportError::InvalidIdentityHeader { value: None };
    /// assert_eq!(err.as_label(), "invalid_identity_header");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ReportError::Lot(e) => e.as_label(),
            ReportError::UnknownIdentity { .. } => "unknown_identity",
            ReportError::InvalidIdentityHeader { .. } => "invalid_identity_header",
            ReportError::InvalidInterval { .. } => "invalid_interval",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ReportError::Lot(e) => e.to_string(),
            ReportError::UnknownIdentity { connection } => {
                format!("unknown connection: {connection}")
            }
            ReportError::InvalidIdentityHeader { value: Some(v) } => {
                format!("invalid station identity: {v}")
            }
            ReportError::InvalidIdentityHeader { value: None } => {
                "missing station identity".to_string()
            }
            ReportError::InvalidInterval {
                arrived_at,
                departed_at,
            } => format!("invalid interval: arrived={arrived_at} departed={departed_at}"),
        }
    }

    /// True for slot conflicts reported by a station (see [`LotError::is_slot_conflict`]).
    pub fn is_slot_conflict(&self) -> bool {
        matches!(self, ReportError::Lot(e) if e.is_slot_conflict())
    }
}
