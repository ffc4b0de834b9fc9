//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the lot service.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `LotService` handlers, `SubscriberSet` workers (overflow/panic),
//!   the daemon's shutdown path.
//! - **Consumers**: `LotService::event_listener()` (fans out to `SubscriberSet`).
//!
//! Outbound station notices do **not** travel over the bus; they go straight to the
//! [`Dispatch`](crate::Dispatch) implementation so they cannot be dropped on lag.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
