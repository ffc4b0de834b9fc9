//! Service core: report handling, notices and lifecycle.
//!
//! The only entry point from this module is [`LotService`], which handles station
//! reports and orders, and hands outbound [`Notice`]s to a [`Dispatch`] implementation.
//!
//! Internal modules:
//! - [`service`]: report handlers, edge-triggered notices and event publishing;
//! - [`builder`]: wires bus, subscribers and dispatcher;
//! - [`dispatch`]: outbound notice types and the dispatcher seam;
//! - [`payloads`]: inbound bodies and handler outcomes;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod dispatch;
mod payloads;
mod service;
mod shutdown;

pub use builder::LotServiceBuilder;
pub use dispatch::{
    CLOSE_FLOOR_EVENT, CLOSE_PARKING_LOT_EVENT, Dispatch, Notice, NullDispatch, OPEN_FLOOR_EVENT,
    OPEN_PARKING_LOT_EVENT, PARKING_LOT_STATE_EVENT, StationState,
};
pub use payloads::{Arrival, Connected, Departure, FloorOrder, SpaceReport};
pub use service::LotService;
pub use shutdown::wait_for_shutdown_signal;
