//! # Station ↔ connection directory.
//!
//! [`ClientDirectory`] keeps at most one live connection per [`StationIdentity`] and
//! answers the reverse question "which station is this connection?".
//!
//! ## Rules
//! - `bind` overwrites; the superseded handle is returned so the caller can evict it
//! - `unbind` clears a binding only if it still points at the given handle, so a late
//!   disconnect of a superseded connection never unbinds its replacement
//! - Own `RwLock`, never held together with the [`LotState`](crate::LotState) guard

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::identity::StationIdentity;

/// Opaque transport handle of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Arc<str>);

impl ConnectionId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Thread-safe mapping `StationIdentity → Option<ConnectionId>`.
pub struct ClientDirectory {
    slots: RwLock<[Option<ConnectionId>; 3]>,
}

impl ClientDirectory {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new([None, None, None]),
        }
    }

    /// Binds `identity` to `conn`, returning the handle it replaced (if different).
    pub async fn bind(&self, identity: StationIdentity, conn: ConnectionId) -> Option<ConnectionId> {
        let mut slots = self.slots.write().await;
        let previous = slots[identity.floor()].replace(conn.clone());
        previous.filter(|p| *p != conn)
    }

    /// Clears the binding currently pointing at `conn`; no-op if none does.
    pub async fn unbind(&self, conn: &ConnectionId) -> Option<StationIdentity> {
        let mut slots = self.slots.write().await;
        let idx = slots.iter().position(|s| s.as_ref() == Some(conn))?;
        slots[idx] = None;
        StationIdentity::from_floor(idx)
    }

    /// Station bound to `conn`.
    pub async fn resolve(&self, conn: &ConnectionId) -> Option<StationIdentity> {
        let slots = self.slots.read().await;
        slots
            .iter()
            .position(|s| s.as_ref() == Some(conn))
            .and_then(StationIdentity::from_floor)
    }

    /// Connection bound to `identity`.
    pub async fn get(&self, identity: StationIdentity) -> Option<ConnectionId> {
        self.slots.read().await[identity.floor()].clone()
    }

    /// Identities that currently have a live connection, in floor order.
    pub async fn bound(&self) -> Vec<StationIdentity> {
        let slots = self.slots.read().await;
        StationIdentity::iter()
            .filter(|id| slots[id.floor()].is_some())
            .collect()
    }
}

impl Default for ClientDirectory {
    fn default() -> Self {
        Self::new()
    }
}
