//! # One floor of the facility.
//!
//! A [`FloorSection`] owns a fixed layout of [`SPACES_PER_FLOOR`] slots:
//!
//! ```text
//! space:     0            1        2        3       4       5       6       7
//!        Handicapped   Elderly  Elderly  Normal  Normal  Normal  Normal  Normal
//! ```
//!
//! `occupied` always equals the number of non-empty slots; it changes only when the
//! delegated slot operation succeeds. `closed` records an explicit close order and is
//! independent of fullness.

use serde::Serialize;

use super::slot::{CarRecord, SpaceCategory, SpaceSlot};
use crate::error::LotError;

/// Number of spaces on every floor.
pub const SPACES_PER_FLOOR: usize = 8;

const LAYOUT: [SpaceCategory; SPACES_PER_FLOOR] = [
    SpaceCategory::Handicapped,
    SpaceCategory::Elderly,
    SpaceCategory::Elderly,
    SpaceCategory::Normal,
    SpaceCategory::Normal,
    SpaceCategory::Normal,
    SpaceCategory::Normal,
    SpaceCategory::Normal,
];

/// Fixed, ordered collection of slots with its own occupancy counter.
#[derive(Debug, Clone)]
pub struct FloorSection {
    slots: Vec<SpaceSlot>,
    occupied: usize,
    closed: bool,
}

/// Serializable view of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceView {
    pub category: SpaceCategory,
    pub occupant: Option<CarRecord>,
}

/// Serializable view of one floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FloorView {
    pub spaces: Vec<SpaceView>,
    pub occupied: usize,
    pub is_full: bool,
    /// Closed by order, regardless of occupancy.
    pub closed: bool,
}

impl FloorSection {
    /// Creates an empty floor with the standard layout.
    pub fn new() -> Self {
        Self {
            slots: LAYOUT.iter().copied().map(SpaceSlot::new).collect(),
            occupied: 0,
            closed: false,
        }
    }

    /// Parks `car` on `space`.
    pub fn park(&mut self, space: i64, car: CarRecord) -> Result<(), LotError> {
        let idx = Self::index(space)?;
        self.slots[idx].park(car)?;
        self.occupied += 1;
        Ok(())
    }

    /// Removes the car on `space`.
    pub fn unpark(&mut self, space: i64) -> Result<CarRecord, LotError> {
        let idx = Self::index(space)?;
        let car = self.slots[idx].unpark()?;
        self.occupied -= 1;
        Ok(car)
    }

    /// Car on `space`, if any.
    pub fn peek(&self, space: i64) -> Result<Option<&CarRecord>, LotError> {
        let idx = Self::index(space)?;
        Ok(self.slots[idx].occupant())
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupied == SPACES_PER_FLOOR
    }

    #[inline]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Per-slot occupancy flags in slot order (`true` = occupied).
    pub fn snapshot(&self) -> Vec<bool> {
        self.slots.iter().map(|s| !s.is_empty()).collect()
    }

    /// Full view including categories and occupants.
    pub fn view(&self) -> FloorView {
        FloorView {
            spaces: self
                .slots
                .iter()
                .map(|s| SpaceView {
                    category: s.category(),
                    occupant: s.occupant().copied(),
                })
                .collect(),
            occupied: self.occupied,
            is_full: self.is_full(),
            closed: self.closed,
        }
    }

    /// Empties every slot, lifts a close order and returns the cars that were parked,
    /// in slot order.
    pub(crate) fn clear(&mut self) -> Vec<CarRecord> {
        let cars: Vec<CarRecord> = self.slots.iter_mut().filter_map(|s| s.unpark().ok()).collect();
        self.occupied = 0;
        self.closed = false;
        cars
    }

    fn index(space: i64) -> Result<usize, LotError> {
        usize::try_from(space)
            .ok()
            .filter(|i| *i < SPACES_PER_FLOOR)
            .ok_or(LotError::InvalidSpaceIndex { space })
    }
}

impl Default for FloorSection {
    fn default() -> Self {
        Self::new()
    }
}
