//! # Station groups of live connections.
//!
//! [`Rooms`] is the daemon's [`Dispatch`]: every station identity owns a group of
//! connections, each represented by its outbound line queue and its cancellation token.
//!
//! ## Rules
//! - `emit` encodes once and uses `try_send`; a full or closed queue drops the line
//!   for that connection only
//! - `evict` removes the member and cancels its token; the connection task closes the socket

use std::collections::HashMap;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use super::wire::{self, Outbound};
use crate::core::{Dispatch, Notice};
use crate::stations::{ConnectionId, StationIdentity};

struct Member {
    conn: ConnectionId,
    tx: mpsc::Sender<String>,
    token: CancellationToken,
}

/// Identity → connections mapping used to deliver notices.
#[derive(Default)]
pub struct Rooms {
    groups: RwLock<HashMap<StationIdentity, Vec<Member>>>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `conn` to `station`'s group.
    pub async fn join(
        &self,
        station: StationIdentity,
        conn: ConnectionId,
        tx: mpsc::Sender<String>,
        token: CancellationToken,
    ) {
        let mut groups = self.groups.write().await;
        let group = groups.entry(station).or_default();
        group.retain(|m| m.conn != conn);
        group.push(Member { conn, tx, token });
    }

    /// Removes `conn` from whatever group it is in.
    pub async fn leave(&self, conn: &ConnectionId) -> bool {
        self.take(conn).await.is_some()
    }

    /// Number of connections in `station`'s group.
    pub async fn members(&self, station: StationIdentity) -> usize {
        self.groups
            .read()
            .await
            .get(&station)
            .map_or(0, Vec::len)
    }

    async fn take(&self, conn: &ConnectionId) -> Option<Member> {
        let mut groups = self.groups.write().await;
        for group in groups.values_mut() {
            if let Some(pos) = group.iter().position(|m| &m.conn == conn) {
                return Some(group.swap_remove(pos));
            }
        }
        None
    }
}

#[async_trait]
impl Dispatch for Rooms {
    async fn emit(&self, target: StationIdentity, notice: Notice) {
        let line = match wire::encode(&Outbound::Notice(&notice)) {
            Ok(line) => line,
            Err(e) => {
                warn!("[rooms] encode {} failed: {e}", notice.event_name());
                return;
            }
        };

        let groups = self.groups.read().await;
        let Some(group) = groups.get(&target) else {
            debug!("[rooms] {} dropped: no {target} connection", notice.event_name());
            return;
        };
        for m in group {
            if let Err(e) = m.tx.try_send(line.clone()) {
                warn!(
                    "[rooms] {} to {target} conn={} dropped: {e}",
                    notice.event_name(),
                    m.conn
                );
            }
        }
    }

    async fn evict(&self, conn: &ConnectionId) {
        if let Some(m) = self.take(conn).await {
            m.token.cancel();
        }
    }

    fn name(&self) -> &'static str {
        "rooms"
    }
}
