//! # lotvisor
//!
//! **Lotvisor** tracks real-time occupancy of a three-floor parking facility and tells
//! the floor stations when a floor or the whole facility fills up or frees up again.
//!
//! Each floor has one station (a client connection identifying itself as
//! `ground_floor`, `first_floor` or `second_floor`). Stations report cars arriving at
//! and departing from numbered spaces; the service keeps the authoritative count,
//! charges a fee on departure and raises edge-triggered notices.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ ground_floor │   │ first_floor  │   │ second_floor │
//!     │   station    │   │   station    │   │   station    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  transport (Rooms + TCP JSON lines, or any Dispatch implementation)│
//! └──────┬────────────────────────────────────────────────────▲───────┘
//!        │ car_arrived / car_departed / order_to_*            │ Notice
//!        ▼                                                    │
//! ┌───────────────────────────────────────────────────────────┴───────┐
//! │  LotService                                                       │
//! │  - ClientDirectory (station ↔ connection)                         │
//! │  - SequenceGenerator (car ids 1, 2, 3, ...)                       │
//! │  - LotState (3 × FloorSection × 8 SpaceSlot, one guard)           │
//! │  - FeeCalculator, NotificationPolicy (pure)                       │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ publishes Events: CarParked, FloorClosed, ReportRejected, ...
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                  (capacity: Config::bus_capacity)                 │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │     event_listener     │
//!                       │     (in LotService)    │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      LogWriter  sub2      subN
//! ```
//!
//! ### Report flow
//! ```text
//! car_arrived(conn, { parking_space, timestamp })
//!   ├─► directory.resolve(conn)           ─ unknown ─► UnknownIdentity
//!   ├─► id = sequence.next()
//!   ├─► lot.park(floor, space, car)       ─ taken   ─► AlreadyOccupied
//!   │        └─ FullnessChange { floor: before/after, lot: before/after }
//!   ├─► NotificationPolicy::decide(change)
//!   │        ├─ lot   false → true ─► close_parking_lot
//!   │        └─ floor false → true ─► close_floor
//!   └─► dispatch.emit(station, notice)    (after the guard is released)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                       |
//! |-------------------|---------------------------------------------------------------|------------------------------------------|
//! | **Service**       | Station reports, orders, resync and reset.                    | [`LotService`]                           |
//! | **Occupancy**     | Slots, floors and the facility with consistent counters.      | [`LotState`], [`FloorSection`]           |
//! | **Policies**      | Edge-triggered notices and the departure fee.                 | [`NotificationPolicy`], [`FeeCalculator`]|
//! | **Delivery**      | Pluggable outbound notices to station groups.                 | [`Dispatch`], [`Notice`], [`Rooms`](transport::Rooms) |
//! | **Subscriber API**| Hook into service events (logging, custom subscribers).       | [`Subscribe`], [`LogWriter`]             |
//! | **Errors**        | Typed errors with stable labels.                              | [`LotError`], [`ReportError`]            |
//! | **Configuration** | Centralized settings, loadable from TOML.                     | [`Config`]                               |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use lotvisor::{Config, ConnectionId, LogWriter, LotService, SpaceReport, Subscribe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let svc = LotService::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let ground = ConnectionId::from("ground-1");
//!     let connected = svc.connect(ground.clone(), Some("ground_floor")).await?;
//!     assert_eq!(connected.state.spaces, vec![false; 8]);
//!
//!     for space in 0..8 {
//!         svc.car_arrived(&ground, SpaceReport::new(space, 0)).await?;
//!     }
//!     assert!(svc.lot().is_floor_full(0).await?);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod lot;
mod policies;
mod stations;
mod subscribers;

pub mod transport;

// ---- Public re-exports ----

pub use config::{Config, ConfigError};
pub use self::core::{
    Arrival, CLOSE_FLOOR_EVENT, CLOSE_PARKING_LOT_EVENT, Connected, Departure, Dispatch,
    FloorOrder, LotService, LotServiceBuilder, Notice, NullDispatch, OPEN_FLOOR_EVENT,
    OPEN_PARKING_LOT_EVENT, PARKING_LOT_STATE_EVENT, SpaceReport, StationState,
    wait_for_shutdown_signal,
};
pub use error::{LotError, ReportError};
pub use events::{Bus, Event, EventKind};
pub use lot::{
    CarRecord, FLOORS, FloorSection, FloorStatus, FloorView, FullnessChange, LOT_CAPACITY,
    LotState, LotView, SPACES_PER_FLOOR, SequenceGenerator, SpaceCategory, SpaceSlot, SpaceView,
};
pub use policies::{Decision, Fee, FeeCalculator, Fullness, NotificationPolicy, Transition};
pub use stations::{ClientDirectory, ConnectionId, StationIdentity};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
