//! # Single parking space.
//!
//! A [`SpaceSlot`] holds at most one [`CarRecord`]. Its [`SpaceCategory`] is fixed at
//! construction. Slots carry no lock of their own; they are only reachable through
//! [`LotState`](crate::LotState), whose guard serializes every access.

use serde::Serialize;

use crate::error::LotError;

/// Kind of parking space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceCategory {
    Normal,
    Handicapped,
    Elderly,
}

/// A parked car.
///
/// Created on arrival with an id from [`SequenceGenerator`](crate::SequenceGenerator),
/// dropped once the departure fee is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CarRecord {
    /// Globally unique, monotonically increasing id.
    pub id: u64,
    /// Arrival timestamp (seconds).
    pub arrived_at: i64,
}

impl CarRecord {
    pub fn new(id: u64, arrived_at: i64) -> Self {
        Self { id, arrived_at }
    }
}

/// One physical parking space.
#[derive(Debug, Clone)]
pub struct SpaceSlot {
    category: SpaceCategory,
    occupant: Option<CarRecord>,
}

impl SpaceSlot {
    /// Creates an empty slot of the given category.
    pub fn new(category: SpaceCategory) -> Self {
        Self {
            category,
            occupant: None,
        }
    }

    /// Stores `car`, failing with [`LotError::AlreadyOccupied`] if the slot is taken.
    pub fn park(&mut self, car: CarRecord) -> Result<(), LotError> {
        if let Some(current) = &self.occupant {
            return Err(LotError::AlreadyOccupied {
                occupant: current.id,
            });
        }
        self.occupant = Some(car);
        Ok(())
    }

    /// Removes and returns the occupant, failing with [`LotError::AlreadyEmpty`].
    pub fn unpark(&mut self) -> Result<CarRecord, LotError> {
        self.occupant.take().ok_or(LotError::AlreadyEmpty)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    #[inline]
    pub fn category(&self) -> SpaceCategory {
        self.category
    }

    #[inline]
    pub fn occupant(&self) -> Option<&CarRecord> {
        self.occupant.as_ref()
    }
}
