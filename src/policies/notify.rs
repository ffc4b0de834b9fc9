//! # Edge-triggered open/close decisions.
//!
//! Each scope (the lot, each floor) is either `Open` or `Closed`. A notice is raised
//! only on the mutation that crosses the capacity edge:
//!
//! ```text
//!   before  after   transition
//!   false   false   none
//!   false   true    Closed      (capacity-1 → capacity)
//!   true    false   Opened      (capacity → capacity-1)
//!   true    true    none
//! ```
//!
//! The inputs are captured by [`LotState`](crate::LotState) inside the critical section
//! of the mutation, so two concurrent mutations can never both see the same edge.

use crate::lot::FullnessChange;

/// Fullness of one scope captured around a single mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fullness {
    pub before: bool,
    pub after: bool,
}

impl Fullness {
    #[inline]
    pub const fn new(before: bool, after: bool) -> Self {
        Self { before, after }
    }
}

/// Edge crossed by a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Scope became full.
    Closed,
    /// Scope stopped being full.
    Opened,
}

/// Transitions raised by one mutation, per scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    pub lot: Option<Transition>,
    pub floor: Option<Transition>,
}

impl Decision {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lot.is_none() && self.floor.is_none()
    }
}

/// Stateless policy mapping captured fullness to transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationPolicy;

impl NotificationPolicy {
    /// Transition for a single scope, `None` when fullness did not change.
    pub fn transition(fullness: Fullness) -> Option<Transition> {
        match (fullness.before, fullness.after) {
            (false, true) => Some(Transition::Closed),
            (true, false) => Some(Transition::Opened),
            _ => None,
        }
    }

    /// Evaluates lot and floor scopes independently.
    pub fn decide(change: &FullnessChange) -> Decision {
        Decision {
            lot: Self::transition(change.lot_full),
            floor: Self::transition(change.floor_full),
        }
    }
}
