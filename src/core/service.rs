//! # LotService: station reports, edge-triggered notices and event fan-out.
//!
//! The [`LotService`] owns the occupancy state, the station directory, the car id
//! sequence, the fee calculator, the event bus and the dispatcher. Every inbound
//! station message maps to one async method; the transport calls them from
//! independent tasks.
//!
//! ## Key responsibilities
//! - resolve the reporting connection to a [`StationIdentity`] via [`ClientDirectory`]
//! - mutate [`LotState`] and turn the captured [`FullnessChange`] into notices through
//!   [`NotificationPolicy`]
//! - hand notices to the [`Dispatch`] implementation **after** the guard is released
//! - publish an [`Event`] for every outcome (including rejections) on the [`Bus`]
//!
//! ## High-level architecture
//! ```text
//! transport task (per connection)
//!     │  car_arrived(conn, report)
//!     ▼
//! ClientDirectory.resolve(conn) ──► station ──► floor
//!     │
//! SequenceGenerator.next() ──► CarRecord { id, arrived_at }
//!     │
//! LotState.park(floor, space, car)            ── one guard, before/after captured inside
//!     │        └─► FullnessChange { floor_full, lot_full }
//!     ▼
//! NotificationPolicy::decide(change) ──► Decision { lot, floor }
//!     │
//!     ├─► Dispatch.emit(station, Notice)      (close/open lot, close/open floor)
//!     └─► Bus.publish(Event) ──► event_listener ──► SubscriberSet ──► LogWriter, ...
//! ```
//!
//! ## Rules
//! - A rejected report never changes state and never raises a notice
//! - The three guards (lot, directory, sequence) are never held at the same time
//! - Lot-scope notices go to the reporting station's group, like floor-scope ones
//! - Orders (`order_to_*`) emit unconditionally and do not touch occupancy
//!
//! ## Example
//! ```rust
//! use lotvisor::{Config, ConnectionId, LotService, SpaceReport};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let svc = LotService::builder(Config::default()).build();
//!
//!     let conn = ConnectionId::from("sid-1");
//!     svc.connect(conn.clone(), Some("ground_floor")).await?;
//!
//!     let arrival = svc.car_arrived(&conn, SpaceReport::new(3, 0)).await?;
//!     let departure = svc.car_departed(&conn, SpaceReport::new(3, 125)).await?;
//!
//!     assert_eq!(arrival.car.id, departure.car.id);
//!     assert_eq!(departure.fee.to_string(), "0.20");
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::dispatch::{Dispatch, Notice, StationState};
use super::payloads::{Arrival, Connected, Departure, FloorOrder, SpaceReport};
use crate::config::Config;
use crate::error::ReportError;
use crate::events::{Bus, Event, EventKind};
use crate::lot::{CarRecord, FullnessChange, LotState, LotView, SequenceGenerator};
use crate::policies::{Decision, FeeCalculator, NotificationPolicy, Transition};
use crate::stations::{ClientDirectory, ConnectionId, StationIdentity};
use crate::subscribers::SubscriberSet;

const REASON_FULL: &str = "full";
const REASON_VACANCY: &str = "vacancy";
const REASON_ORDERED: &str = "ordered";
const REASON_RESET: &str = "reset";

/// Central service handling station reports and orders.
pub struct LotService {
    cfg: Config,
    lot: LotState,
    directory: ClientDirectory,
    sequence: SequenceGenerator,
    fees: FeeCalculator,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    dispatch: Arc<dyn Dispatch>,
    token: CancellationToken,
}

impl LotService {
    /// Returns a builder; see [`LotServiceBuilder`](crate::LotServiceBuilder).
    pub fn builder(cfg: Config) -> super::builder::LotServiceBuilder {
        super::builder::LotServiceBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        dispatch: Arc<dyn Dispatch>,
    ) -> Self {
        Self {
            fees: cfg.fee_calculator(),
            cfg,
            lot: LotState::new(),
            directory: ClientDirectory::new(),
            sequence: SequenceGenerator::new(),
            bus,
            subs,
            dispatch,
            token: CancellationToken::new(),
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    ///
    /// Stops when the service is dropped.
    pub(super) fn event_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        let token = self.token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    // ---------------------------
    // Connection lifecycle
    // ---------------------------

    /// Binds `conn` to the station named by `header`.
    ///
    /// A previous connection of the same station is superseded and, unless disabled by
    /// [`Config::evict_superseded`], evicted through [`Dispatch::evict`].
    pub async fn connect(
        &self,
        conn: ConnectionId,
        header: Option<&str>,
    ) -> Result<Connected, ReportError> {
        let station = StationIdentity::from_header(header).inspect_err(|e| {
            self.bus.publish(
                Event::new(EventKind::ConnectionRejected)
                    .with_connection(&conn)
                    .with_reason(e.as_message()),
            );
        })?;

        let superseded = self.directory.bind(station, conn.clone()).await;
        if let Some(old) = &superseded {
            if self.cfg.evict_superseded {
                self.dispatch.evict(old).await;
            }
            self.bus.publish(
                Event::new(EventKind::StationEvicted)
                    .with_station(station)
                    .with_connection(old),
            );
        }

        let state = self.station_state(station).await;
        self.bus.publish(
            Event::new(EventKind::StationConnected)
                .with_station(station)
                .with_connection(&conn),
        );
        Ok(Connected {
            station,
            state,
            superseded,
        })
    }

    /// Forgets `conn`; returns the station it was bound to, if it still was.
    pub async fn disconnect(&self, conn: &ConnectionId) -> Option<StationIdentity> {
        let station = self.directory.unbind(conn).await?;
        self.bus.publish(
            Event::new(EventKind::StationDisconnected)
                .with_station(station)
                .with_connection(conn),
        );
        Some(station)
    }

    // ---------------------------
    // Station reports
    // ---------------------------

    /// Handles `car_arrived` from `conn`.
    pub async fn car_arrived(
        &self,
        conn: &ConnectionId,
        report: SpaceReport,
    ) -> Result<Arrival, ReportError> {
        self.arrive(conn, report)
            .await
            .inspect_err(|e| self.reject(Some(conn), report.parking_space, e))
    }

    async fn arrive(&self, conn: &ConnectionId, report: SpaceReport) -> Result<Arrival, ReportError> {
        let station = self.resolve(conn).await?;
        let car = CarRecord::new(self.sequence.next(), report.timestamp);
        let change = self
            .lot
            .park(station.floor() as i64, report.parking_space, car)
            .await?;

        self.bus.publish(
            Event::new(EventKind::CarParked)
                .with_station(station)
                .with_connection(conn)
                .with_space(report.parking_space)
                .with_car(car.id),
        );
        let decision = self.apply(station, &change).await;
        Ok(Arrival {
            station,
            car,
            decision,
        })
    }

    /// Handles `car_departed` from `conn`.
    ///
    /// The fee is validated under the lot guard before the car is removed, so a
    /// departure timestamp earlier than the arrival leaves the car parked.
    pub async fn car_departed(
        &self,
        conn: &ConnectionId,
        report: SpaceReport,
    ) -> Result<Departure, ReportError> {
        self.depart(conn, report)
            .await
            .inspect_err(|e| self.reject(Some(conn), report.parking_space, e))
    }

    async fn depart(&self, conn: &ConnectionId, report: SpaceReport) -> Result<Departure, ReportError> {
        let station = self.resolve(conn).await?;
        let fees = self.fees;
        let (car, fee, change) = self
            .lot
            .unpark_with(station.floor() as i64, report.parking_space, |car| {
                fees.calculate(car.arrived_at, report.timestamp)
            })
            .await?;

        self.bus.publish(
            Event::new(EventKind::CarDeparted)
                .with_station(station)
                .with_connection(conn)
                .with_space(report.parking_space)
                .with_car(car.id)
                .with_fee(fee),
        );
        let decision = self.apply(station, &change).await;
        Ok(Departure {
            station,
            car,
            fee,
            decision,
        })
    }

    // ---------------------------
    // Orders
    // ---------------------------

    /// Records a close order for the facility and tells the ground floor station.
    pub async fn order_to_close_parking_lot(&self) {
        self.lot.set_closed(true).await;
        self.notify_lot(StationIdentity::Ground, Transition::Closed, REASON_ORDERED)
            .await;
    }

    /// Lifts the facility close order and tells the ground floor station.
    pub async fn order_to_open_parking_lot(&self) {
        self.lot.set_closed(false).await;
        self.notify_lot(StationIdentity::Ground, Transition::Opened, REASON_ORDERED)
            .await;
    }

    /// Records a close order for the floor named in `order` and tells its station.
    pub async fn order_to_close_floor(
        &self,
        order: &FloorOrder,
    ) -> Result<StationIdentity, ReportError> {
        self.order_floor(order, Transition::Closed).await
    }

    /// Lifts the close order of the floor named in `order` and tells its station.
    pub async fn order_to_open_floor(
        &self,
        order: &FloorOrder,
    ) -> Result<StationIdentity, ReportError> {
        self.order_floor(order, Transition::Opened).await
    }

    async fn order_floor(
        &self,
        order: &FloorOrder,
        transition: Transition,
    ) -> Result<StationIdentity, ReportError> {
        let station = StationIdentity::from_header(Some(order.client_id.as_str()))
            .inspect_err(|e| self.reject(None, -1, e))?;
        self.lot
            .set_floor_closed(station, transition == Transition::Closed)
            .await;
        self.notify_floor(station, transition, REASON_ORDERED).await;
        Ok(station)
    }

    /// Empties every space, lifts every close order and resyncs every station; returns the
    /// number of cars dropped.
    pub async fn reset_parking_lot(&self) -> usize {
        let dropped = self.lot.reset().await.len();
        self.bus.publish(
            Event::new(EventKind::LotReset).with_reason(format!("dropped={dropped}")),
        );

        for station in StationIdentity::iter() {
            let state = self.station_state(station).await;
            self.dispatch
                .emit(station, Notice::ParkingLotState(state))
                .await;
            self.notify_floor(station, Transition::Opened, REASON_RESET)
                .await;
        }
        self.notify_lot(StationIdentity::Ground, Transition::Opened, REASON_RESET)
            .await;
        dropped
    }

    /// Announces shutdown on the bus; the daemon calls it when a termination signal arrives.
    pub fn announce_shutdown(&self) {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
    }

    // ---------------------------
    // Queries
    // ---------------------------

    /// Resync payload for `station`.
    pub async fn station_state(&self, station: StationIdentity) -> StationState {
        let status = self.lot.station_view(station).await;
        StationState {
            station,
            floor: station.floor(),
            spaces: status.spaces,
            floor_full: status.floor_full,
            floor_closed: status.floor_closed,
            lot_full: status.lot_full,
            lot_closed: status.lot_closed,
        }
    }

    /// Consistent view of the whole facility.
    pub async fn snapshot(&self) -> LotView {
        self.lot.snapshot().await
    }

    /// Station currently bound to `conn`.
    pub async fn station_of(&self, conn: &ConnectionId) -> Option<StationIdentity> {
        self.directory.resolve(conn).await
    }

    pub fn lot(&self) -> &LotState {
        &self.lot
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Last car id handed out.
    pub fn last_car_id(&self) -> u64 {
        self.sequence.last()
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    async fn resolve(&self, conn: &ConnectionId) -> Result<StationIdentity, ReportError> {
        self.directory
            .resolve(conn)
            .await
            .ok_or_else(|| ReportError::UnknownIdentity {
                connection: conn.to_string(),
            })
    }

    /// Raises the notices implied by one mutation; lot scope first, then floor scope.
    async fn apply(&self, station: StationIdentity, change: &FullnessChange) -> Decision {
        let decision = NotificationPolicy::decide(change);
        if let Some(t) = decision.lot {
            self.notify_lot(station, t, edge_reason(t)).await;
        }
        if let Some(t) = decision.floor {
            self.notify_floor(station, t, edge_reason(t)).await;
        }
        decision
    }

    async fn notify_lot(&self, target: StationIdentity, t: Transition, reason: &'static str) {
        let (notice, kind) = match t {
            Transition::Closed => (Notice::CloseParkingLot, EventKind::LotClosed),
            Transition::Opened => (Notice::OpenParkingLot, EventKind::LotOpened),
        };
        self.dispatch.emit(target, notice).await;
        self.bus
            .publish(Event::new(kind).with_station(target).with_reason(reason));
    }

    async fn notify_floor(&self, target: StationIdentity, t: Transition, reason: &'static str) {
        let (notice, kind) = match t {
            Transition::Closed => (Notice::CloseFloor, EventKind::FloorClosed),
            Transition::Opened => (Notice::OpenFloor, EventKind::FloorOpened),
        };
        self.dispatch.emit(target, notice).await;
        self.bus
            .publish(Event::new(kind).with_station(target).with_reason(reason));
    }

    fn reject(&self, conn: Option<&ConnectionId>, space: i64, err: &ReportError) {
        let mut ev = Event::new(EventKind::ReportRejected)
            .with_reason(format!("{}: {}", err.as_label(), err.as_message()));
        if let Some(conn) = conn {
            ev = ev.with_connection(conn);
        }
        if space >= 0 {
            ev = ev.with_space(space);
        }
        self.bus.publish(ev);
    }
}

fn edge_reason(t: Transition) -> &'static str {
    match t {
        Transition::Closed => REASON_FULL,
        Transition::Opened => REASON_VACANCY,
    }
}

impl Drop for LotService {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
