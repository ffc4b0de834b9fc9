//! Pricing and notification policies.
//!
//! This module groups the pure decision logic applied around every occupancy
//! mutation: **what a departing car pays** and **which notices a mutation raises**.
//!
//! ## Contents
//! - [`FeeCalculator`] elapsed whole minutes × rate → [`Fee`]
//! - [`Fullness`] before/after fullness of one scope
//! - [`Transition`] edge derived from a [`Fullness`] (closed / opened)
//! - [`NotificationPolicy`] lot and floor transitions for one mutation
//!
//! ## Quick wiring
//! ```text
//! LotState::park/unpark ─► FullnessChange { floor_full, lot_full }   (captured under guard)
//!      └─► NotificationPolicy::decide(change) ─► Decision { lot, floor }
//!                └─► LotService maps each Some(Transition) to one Notice
//! ```
//!
//! ## Defaults
//! - `FeeCalculator::default()` → 10 hundredths (0.1 unit) per whole minute.

mod fee;
mod notify;

pub use fee::{Fee, FeeCalculator};
pub use notify::{Decision, Fullness, NotificationPolicy, Transition};
