//! Occupancy hierarchy: slots, floors and the facility.
//!
//! ```text
//! LotState (guard) ──► FloorSection × 3 ──► SpaceSlot × 8
//! SequenceGenerator (atomic, independent of the LotState guard)
//! ```
//!
//! - [`slot`]: one space and the car parked on it;
//! - [`floor`]: fixed layout of eight spaces with a running count;
//! - [`state`]: the guarded facility and the fullness captured per mutation;
//! - [`sequence`]: car ids.

mod floor;
mod sequence;
mod slot;
mod state;

pub use floor::{FloorSection, FloorView, SPACES_PER_FLOOR, SpaceView};
pub use sequence::SequenceGenerator;
pub use slot::{CarRecord, SpaceCategory, SpaceSlot};
pub use state::{FLOORS, FloorStatus, FullnessChange, LOT_CAPACITY, LotState, LotView};
