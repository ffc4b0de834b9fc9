//! # LogWriter — event logger
//!
//! A subscriber that renders incoming [`Event`]s through the [`log`] facade. Install any
//! `log` backend (the daemon uses `env_logger`) to see the output.
//!
//! ## Example output
//! ```text
//! INFO  [connected] station=first_floor conn=7
//! INFO  [parked] station=first_floor space=3 car=12
//! INFO  [departed] station=first_floor space=3 car=12 fee=0.20
//! INFO  [floor-closed] station=ground_floor reason=full
//! WARN  [rejected] conn=9 reason=slot_already_empty: parking space is already empty
//! WARN  [evicted] station=second_floor conn=4
//! ```

use async_trait::async_trait;
use ::log::{info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn station(e: &Event) -> &'static str {
    e.station.map(|s| s.as_str()).unwrap_or("-")
}

fn conn(e: &Event) -> &str {
    e.connection.as_ref().map(|c| c.as_str()).unwrap_or("-")
}

fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

fn reason(e: &Event) -> &str {
    e.reason.as_deref().unwrap_or("-")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::StationConnected => {
                info!("[connected] station={} conn={}", station(e), conn(e));
            }
            EventKind::StationEvicted => {
                warn!("[evicted] station={} conn={}", station(e), conn(e));
            }
            EventKind::StationDisconnected => {
                info!("[disconnected] station={} conn={}", station(e), conn(e));
            }
            EventKind::ConnectionRejected => {
                warn!("[connection-rejected] conn={} reason={}", conn(e), reason(e));
            }
            EventKind::CarParked => {
                info!(
                    "[parked] station={} space={} car={}",
                    station(e),
                    opt(e.space),
                    opt(e.car)
                );
            }
            EventKind::CarDeparted => {
                info!(
                    "[departed] station={} space={} car={} fee={}",
                    station(e),
                    opt(e.space),
                    opt(e.car),
                    opt(e.fee)
                );
            }
            EventKind::ReportRejected => {
                warn!(
                    "[rejected] station={} conn={} reason={}",
                    station(e),
                    conn(e),
                    reason(e)
                );
            }
            EventKind::LotReset => {
                info!("[reset] {}", reason(e));
            }
            EventKind::FloorClosed => {
                info!("[floor-closed] station={} reason={}", station(e), reason(e));
            }
            EventKind::FloorOpened => {
                info!("[floor-opened] station={} reason={}", station(e), reason(e));
            }
            EventKind::LotClosed => {
                info!("[lot-closed] notify={} reason={}", station(e), reason(e));
            }
            EventKind::LotOpened => {
                info!("[lot-opened] notify={} reason={}", station(e), reason(e));
            }
            EventKind::SubscriberPanicked => {
                warn!("[subscriber-panicked] {}", reason(e));
            }
            EventKind::SubscriberOverflow => {
                warn!("[subscriber-overflow] {}", reason(e));
            }
            EventKind::ShutdownRequested => {
                info!("[shutdown-requested]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
