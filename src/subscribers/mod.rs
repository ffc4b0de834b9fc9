//! # Event subscribers for the lot service.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! LotService ── publish(Event) ──► Bus ──► event_listener ──► SubscriberSet
//!                                                               │
//!                                                  ┌────────────┼────────────┐
//!                                                  ▼            ▼            ▼
//!                                              LogWriter      Custom        ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use lotvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct FullAlerts;
//!
//! #[async_trait]
//! impl Subscribe for FullAlerts {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::LotClosed {
//!             // page the attendant
//!         }
//!     }
//!     fn name(&self) -> &'static str { "full-alerts" }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
