//! Floor stations: who they are and which connection currently speaks for them.
//!
//! - [`StationIdentity`] closed set of stations, mapped 1:1 to floor indexes;
//! - [`ClientDirectory`] live connection per station;
//! - [`ConnectionId`] opaque transport handle.

mod directory;
mod identity;

pub use directory::{ClientDirectory, ConnectionId};
pub use identity::StationIdentity;
