//! Reference transport: newline-delimited JSON over TCP.
//!
//! - [`wire`]: frame types and encoding;
//! - [`rooms`]: [`Rooms`], the station-group [`Dispatch`](crate::Dispatch) implementation;
//! - [`server`]: accept loop, handshake and per-connection reader/writer tasks.

pub mod wire;

mod rooms;
mod server;

pub use rooms::Rooms;
pub use server::{ServeError, bind, serve};
