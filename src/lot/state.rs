//! # Facility-wide occupancy state.
//!
//! [`LotState`] is the authoritative occupancy container. It owns every
//! [`FloorSection`] behind **one** coarse guard; floors and slots have no locks of their
//! own, so there is no lock ordering to get wrong.
//!
//! ## Architecture
//! ```text
//! LotState
//!   └─ Mutex<Inner>                      (single guard)
//!        ├─ occupied: usize              (running total, capped at LOT_CAPACITY)
//!        ├─ closed: bool                 (close order for the whole facility)
//!        └─ floors: [FloorSection; 3]
//!             └─ slots: [SpaceSlot; 8]
//! ```
//!
//! ## Rules
//! - `occupied == Σ floor.occupied()` whenever the guard is released
//! - Fullness **before** and **after** a mutation is captured inside the same critical
//!   section as the mutation and returned as a [`FullnessChange`]
//! - A rejected mutation changes nothing (validation happens before any counter moves)
//! - Close orders (`closed` on the lot and on each floor) are recorded under the same
//!   guard, are independent of fullness and are lifted only by an open order or `reset`
//! - No I/O is performed while the guard is held

use serde::Serialize;
use tokio::sync::Mutex;

use super::floor::{FloorSection, FloorView, SPACES_PER_FLOOR};
use super::slot::CarRecord;
use crate::error::LotError;
use crate::policies::Fullness;
use crate::stations::StationIdentity;

/// Number of floors in the facility.
pub const FLOORS: usize = 3;

/// Total number of spaces in the facility.
pub const LOT_CAPACITY: usize = FLOORS * SPACES_PER_FLOOR;

/// Fullness of both scopes around one mutation, captured under the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullnessChange {
    /// Floor the mutation touched.
    pub floor: usize,
    /// Fullness of that floor before/after.
    pub floor_full: Fullness,
    /// Fullness of the facility before/after.
    pub lot_full: Fullness,
}

/// Serializable view of the whole facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotView {
    pub floors: Vec<FloorView>,
    pub occupied: usize,
    pub is_full: bool,
    /// Closed by order, regardless of occupancy.
    pub closed: bool,
}

/// One floor as its station sees it, read under one guard acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorStatus {
    /// Occupancy per space in slot order (`true` = occupied).
    pub spaces: Vec<bool>,
    pub floor_full: bool,
    pub floor_closed: bool,
    pub lot_full: bool,
    pub lot_closed: bool,
}

#[derive(Debug)]
struct Inner {
    floors: Vec<FloorSection>,
    occupied: usize,
    closed: bool,
}

impl Inner {
    fn is_full(&self) -> bool {
        self.occupied == LOT_CAPACITY
    }

    fn floor(&self, floor: i64) -> Result<&FloorSection, LotError> {
        let idx = floor_index(floor)?;
        Ok(&self.floors[idx])
    }
}

fn floor_index(floor: i64) -> Result<usize, LotError> {
    usize::try_from(floor)
        .ok()
        .filter(|i| *i < FLOORS)
        .ok_or(LotError::InvalidFloorIndex { floor })
}

/// Thread-safe occupancy container for the whole facility.
pub struct LotState {
    inner: Mutex<Inner>,
}

impl LotState {
    /// Creates an empty facility.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                floors: (0..FLOORS).map(|_| FloorSection::new()).collect(),
                occupied: 0,
                closed: false,
            }),
        }
    }

    /// Parks `car` on (`floor`, `space`).
    ///
    /// Returns the fullness of the touched floor and of the facility around the
    /// mutation. Slot failures are propagated unchanged and leave every count intact.
    pub async fn park(
        &self,
        floor: i64,
        space: i64,
        car: CarRecord,
    ) -> Result<FullnessChange, LotError> {
        let idx = floor_index(floor)?;
        let mut inner = self.inner.lock().await;

        let lot_before = inner.is_full();
        let section = &mut inner.floors[idx];
        let floor_before = section.is_full();
        section.park(space, car)?;
        let floor_after = section.is_full();

        inner.occupied += 1;
        Ok(FullnessChange {
            floor: idx,
            floor_full: Fullness::new(floor_before, floor_after),
            lot_full: Fullness::new(lot_before, inner.is_full()),
        })
    }

    /// Removes the car on (`floor`, `space`); symmetric to [`park`](Self::park).
    pub async fn unpark(
        &self,
        floor: i64,
        space: i64,
    ) -> Result<(CarRecord, FullnessChange), LotError> {
        let (car, (), change) = self
            .unpark_with(floor, space, |_| Ok::<(), LotError>(()))
            .await?;
        Ok((car, change))
    }

    /// Removes the car on (`floor`, `space`) only if `check` accepts it.
    ///
    /// `check` runs under the guard, after the slot is known to be occupied and before
    /// anything changes; an `Err` from it aborts the departure with the state untouched.
    /// It must be a pure computation (no I/O, no other locks).
    pub async fn unpark_with<T, E, F>(
        &self,
        floor: i64,
        space: i64,
        check: F,
    ) -> Result<(CarRecord, T, FullnessChange), E>
    where
        E: From<LotError>,
        F: FnOnce(&CarRecord) -> Result<T, E>,
    {
        let idx = floor_index(floor)?;
        let mut inner = self.inner.lock().await;

        let lot_before = inner.is_full();
        let section = &mut inner.floors[idx];
        let floor_before = section.is_full();
        let accepted = match section.peek(space)? {
            Some(car) => check(car)?,
            None => return Err(LotError::AlreadyEmpty.into()),
        };
        let car = section.unpark(space)?;
        let floor_after = section.is_full();

        inner.occupied -= 1;
        let change = FullnessChange {
            floor: idx,
            floor_full: Fullness::new(floor_before, floor_after),
            lot_full: Fullness::new(lot_before, inner.is_full()),
        };
        Ok((car, accepted, change))
    }

    pub async fn is_full(&self) -> bool {
        self.inner.lock().await.is_full()
    }

    pub async fn is_floor_full(&self, floor: i64) -> Result<bool, LotError> {
        Ok(self.inner.lock().await.floor(floor)?.is_full())
    }

    /// Per-space occupancy flags of one floor (`true` = occupied).
    pub async fn floor_snapshot(&self, floor: i64) -> Result<Vec<bool>, LotError> {
        Ok(self.inner.lock().await.floor(floor)?.snapshot())
    }

    /// Number of parked cars in the facility.
    pub async fn occupied(&self) -> usize {
        self.inner.lock().await.occupied
    }

    pub async fn floor_occupied(&self, floor: i64) -> Result<usize, LotError> {
        Ok(self.inner.lock().await.floor(floor)?.occupied())
    }

    /// Consistent view of every floor, taken under one guard acquisition.
    pub async fn snapshot(&self) -> LotView {
        let inner = self.inner.lock().await;
        LotView {
            floors: inner.floors.iter().map(FloorSection::view).collect(),
            occupied: inner.occupied,
            is_full: inner.is_full(),
            closed: inner.closed,
        }
    }

    /// Occupancy and close state of `station`'s floor and of the facility.
    pub async fn station_view(&self, station: StationIdentity) -> FloorStatus {
        let inner = self.inner.lock().await;
        let section = &inner.floors[station.floor()];
        FloorStatus {
            spaces: section.snapshot(),
            floor_full: section.is_full(),
            floor_closed: section.is_closed(),
            lot_full: inner.is_full(),
            lot_closed: inner.closed,
        }
    }

    /// Records a close (`true`) or open (`false`) order for the whole facility.
    pub async fn set_closed(&self, closed: bool) {
        self.inner.lock().await.closed = closed;
    }

    /// Records a close or open order for `station`'s floor.
    pub async fn set_floor_closed(&self, station: StationIdentity, closed: bool) {
        self.inner.lock().await.floors[station.floor()].set_closed(closed);
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    pub async fn is_floor_closed(&self, floor: i64) -> Result<bool, LotError> {
        Ok(self.inner.lock().await.floor(floor)?.is_closed())
    }

    /// Empties the whole facility, lifts every close order and returns the cars that
    /// were parked.
    pub async fn reset(&self) -> Vec<CarRecord> {
        let mut inner = self.inner.lock().await;
        let cars: Vec<CarRecord> = inner.floors.iter_mut().flat_map(FloorSection::clear).collect();
        inner.occupied = 0;
        inner.closed = false;
        cars
    }

    #[cfg(test)]
    async fn assert_consistent(&self) {
        let inner = self.inner.lock().await;
        let per_floor: usize = inner.floors.iter().map(FloorSection::occupied).sum();
        let per_slot: usize = inner
            .floors
            .iter()
            .map(|f| f.snapshot().into_iter().filter(|o| *o).count())
            .sum();
        assert_eq!(inner.occupied, per_floor);
        assert_eq!(per_floor, per_slot);
    }
}

impl Default for LotState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::Rng;

    use super::*;

    async fn fill_floor(lot: &LotState, floor: i64, first_id: u64) {
        for space in 0..SPACES_PER_FLOOR as i64 {
            lot.park(floor, space, CarRecord::new(first_id + space as u64, 0))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let lot = LotState::new();
        let car = CarRecord::new(7, 42);

        lot.park(1, 4, car).await.unwrap();
        let (back, _) = lot.unpark(1, 4).await.unwrap();

        assert_eq!(back, car);
        assert_eq!(lot.floor_snapshot(1).await.unwrap(), vec![false; 8]);
        assert_eq!(lot.occupied().await, 0);
    }

    #[tokio::test]
    async fn test_double_park_leaves_state_unchanged() {
        let lot = LotState::new();
        lot.park(0, 2, CarRecord::new(1, 0)).await.unwrap();

        let err = lot.park(0, 2, CarRecord::new(2, 0)).await.unwrap_err();
        assert!(err.is_slot_conflict());
        assert_eq!(lot.occupied().await, 1);

        let (car, _) = lot.unpark(0, 2).await.unwrap();
        assert_eq!(car.id, 1);
    }

    #[tokio::test]
    async fn test_double_unpark_fails() {
        let lot = LotState::new();
        lot.park(2, 0, CarRecord::new(1, 0)).await.unwrap();
        lot.unpark(2, 0).await.unwrap();

        assert_eq!(lot.unpark(2, 0).await.unwrap_err(), LotError::AlreadyEmpty);
        assert_eq!(lot.occupied().await, 0);
        lot.assert_consistent().await;
    }

    #[tokio::test]
    async fn test_rejected_check_keeps_car() {
        let lot = LotState::new();
        lot.park(0, 1, CarRecord::new(4, 500)).await.unwrap();

        let res: Result<(CarRecord, (), FullnessChange), LotError> = lot
            .unpark_with(0, 1, |_| Err(LotError::AlreadyEmpty))
            .await;
        assert!(res.is_err());
        assert_eq!(lot.occupied().await, 1);

        let (car, arrived, _) = lot
            .unpark_with(0, 1, |car| Ok::<i64, LotError>(car.arrived_at))
            .await
            .unwrap();
        assert_eq!((car.id, arrived), (4, 500));
        lot.assert_consistent().await;
    }

    #[tokio::test]
    async fn test_invalid_indexes() {
        let lot = LotState::new();
        let car = CarRecord::new(1, 0);

        assert_eq!(
            lot.park(3, 0, car).await.unwrap_err(),
            LotError::InvalidFloorIndex { floor: 3 }
        );
        assert_eq!(
            lot.park(-1, 0, car).await.unwrap_err(),
            LotError::InvalidFloorIndex { floor: -1 }
        );
        assert_eq!(
            lot.park(0, 8, car).await.unwrap_err(),
            LotError::InvalidSpaceIndex { space: 8 }
        );
        assert!(lot.is_floor_full(5).await.is_err());
        assert!(lot.floor_snapshot(9).await.is_err());
        assert_eq!(lot.occupied().await, 0);
    }

    #[tokio::test]
    async fn test_eighth_car_flips_floor_full() {
        let lot = LotState::new();
        for space in 0..7 {
            let change = lot.park(1, space, CarRecord::new(space as u64, 0)).await.unwrap();
            assert_eq!(change.floor_full, Fullness::new(false, false));
        }

        let change = lot.park(1, 7, CarRecord::new(8, 0)).await.unwrap();
        assert_eq!(change.floor, 1);
        assert_eq!(change.floor_full, Fullness::new(false, true));
        assert_eq!(change.lot_full, Fullness::new(false, false));
        assert!(lot.is_floor_full(1).await.unwrap());

        let (_, change) = lot.unpark(1, 3).await.unwrap();
        assert_eq!(change.floor_full, Fullness::new(true, false));
        assert!(!lot.is_floor_full(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_twenty_fourth_car_flips_lot_full() {
        let lot = LotState::new();
        fill_floor(&lot, 0, 1).await;
        fill_floor(&lot, 1, 100).await;
        for space in 0..7 {
            lot.park(2, space, CarRecord::new(200 + space as u64, 0))
                .await
                .unwrap();
        }
        assert!(!lot.is_full().await);

        let change = lot.park(2, 7, CarRecord::new(300, 0)).await.unwrap();
        assert_eq!(change.lot_full, Fullness::new(false, true));
        assert_eq!(change.floor_full, Fullness::new(false, true));
        assert!(lot.is_full().await);
        assert_eq!(lot.occupied().await, LOT_CAPACITY);

        let (_, change) = lot.unpark(0, 0).await.unwrap();
        assert_eq!(change.lot_full, Fullness::new(true, false));
        assert_eq!(change.floor, 0);
    }

    #[tokio::test]
    async fn test_randomized_operations_keep_counts_consistent() {
        let lot = LotState::new();
        let mut rng = rand::rng();

        for id in 0..2_000u64 {
            let floor = rng.random_range(-1..=FLOORS as i64);
            let space = rng.random_range(-1..=SPACES_PER_FLOOR as i64);
            if rng.random_bool(0.6) {
                let _ = lot.park(floor, space, CarRecord::new(id, 0)).await;
            } else {
                let _ = lot.unpark(floor, space).await;
            }
            lot.assert_consistent().await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_arrivals_no_lost_update() {
        let lot = Arc::new(LotState::new());
        let mut handles = Vec::new();

        for n in 0..LOT_CAPACITY {
            let lot = Arc::clone(&lot);
            let floor = (n % FLOORS) as i64;
            let space = (n / FLOORS) as i64;
            handles.push(tokio::spawn(async move {
                lot.park(floor, space, CarRecord::new(n as u64, 0)).await
            }));
        }

        let mut closes = 0;
        for h in handles {
            let change = h.await.unwrap().unwrap();
            if change.lot_full.before != change.lot_full.after {
                closes += 1;
            }
        }

        assert_eq!(lot.occupied().await, LOT_CAPACITY);
        assert_eq!(closes, 1);
        lot.assert_consistent().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_departures_open_once() {
        let lot = Arc::new(LotState::new());
        for floor in 0..FLOORS as i64 {
            fill_floor(&lot, floor, floor as u64 * 10).await;
        }

        let mut handles = Vec::new();
        for space in 0..SPACES_PER_FLOOR as i64 {
            let lot = Arc::clone(&lot);
            handles.push(tokio::spawn(async move { lot.unpark(0, space).await }));
        }

        let mut lot_opens = 0;
        let mut floor_opens = 0;
        for h in handles {
            let (_, change) = h.await.unwrap().unwrap();
            if change.lot_full == Fullness::new(true, false) {
                lot_opens += 1;
            }
            if change.floor_full == Fullness::new(true, false) {
                floor_opens += 1;
            }
        }

        assert_eq!(lot_opens, 1);
        assert_eq!(floor_opens, 1);
        assert_eq!(lot.floor_occupied(0).await.unwrap(), 0);
        lot.assert_consistent().await;
    }

    #[tokio::test]
    async fn test_reset_empties_everything() {
        let lot = LotState::new();
        fill_floor(&lot, 2, 1).await;
        lot.park(0, 5, CarRecord::new(50, 0)).await.unwrap();
        lot.set_closed(true).await;
        lot.set_floor_closed(StationIdentity::First, true).await;

        let cars = lot.reset().await;
        assert_eq!(cars.len(), 9);
        assert_eq!(lot.occupied().await, 0);

        let view = lot.snapshot().await;
        assert!(!view.closed);
        assert!(view.floors.iter().all(|f| f.occupied == 0 && !f.is_full && !f.closed));
        lot.assert_consistent().await;
    }

    #[tokio::test]
    async fn test_close_orders_survive_occupancy_changes() {
        let lot = LotState::new();
        lot.set_floor_closed(StationIdentity::Second, true).await;
        lot.set_closed(true).await;

        lot.park(2, 3, CarRecord::new(1, 0)).await.unwrap();
        lot.unpark(2, 3).await.unwrap();

        let status = lot.station_view(StationIdentity::Second).await;
        assert!(status.floor_closed && status.lot_closed);
        assert!(!status.floor_full && !status.lot_full);
        assert!(!lot.station_view(StationIdentity::Ground).await.floor_closed);
        assert_eq!(lot.is_floor_closed(2).await, Ok(true));
        assert!(lot.is_floor_closed(3).await.unwrap_err().is_invalid_index());

        lot.set_floor_closed(StationIdentity::Second, false).await;
        lot.set_closed(false).await;
        assert!(!lot.is_closed().await);
        assert_eq!(lot.is_floor_closed(2).await, Ok(false));
    }
}
