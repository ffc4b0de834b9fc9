//! # Newline-delimited JSON frames.
//!
//! ```text
//! client → server   {"event":"hello","client_id":"first_floor"}           (first frame)
//!                   {"event":"car_arrived","data":{"parking_space":3,"timestamp":0}}
//!                   {"event":"order_to_close_floor","data":{"client_id":"ground_floor"}}
//!                   {"event":"reset_parking_lot"}
//! server → client   {"event":"close_floor"}
//!                   {"event":"parking_lot_state","data":{...}}
//!                   {"event":"error","data":{"label":"...","message":"..."}}
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{FloorOrder, Notice, SpaceReport};

/// Label of the error frame sent for a line that does not parse.
pub const MALFORMED_FRAME: &str = "malformed_frame";

/// First frame of every connection; stands in for the `x-client-id` header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Handshake {
    Hello {
        #[serde(default)]
        client_id: Option<String>,
    },
}

impl Handshake {
    pub fn client_id(&self) -> Option<&str> {
        match self {
            Handshake::Hello { client_id } => client_id.as_deref(),
        }
    }
}

/// Frames accepted after the handshake.
///
/// Frames without a payload accept any `data` (absent, `null`, `{}`) and ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    CarArrived(SpaceReport),
    CarDeparted(SpaceReport),
    OrderToCloseParkingLot,
    OrderToOpenParkingLot,
    OrderToCloseFloor(FloorOrder),
    OrderToOpenFloor(FloorOrder),
    ResetParkingLot,
}

/// Frames written to a connection.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outbound<'a> {
    Notice(&'a Notice),
    Reply(Reply<'a>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Reply<'a> {
    Error { label: &'a str, message: &'a str },
}

/// Encodes one frame as a single line (without the trailing newline).
pub fn encode(frame: &Outbound<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}

pub fn error_line(label: &str, message: &str) -> Result<String, serde_json::Error> {
    encode(&Outbound::Reply(Reply::Error { label, message }))
}

pub fn decode_handshake(line: &str) -> Result<Handshake, serde_json::Error> {
    serde_json::from_str(line)
}

const INBOUND_EVENTS: &[&str] = &[
    "car_arrived",
    "car_departed",
    "order_to_close_parking_lot",
    "order_to_open_parking_lot",
    "order_to_close_floor",
    "order_to_open_floor",
    "reset_parking_lot",
];

#[derive(Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

pub fn decode(line: &str) -> Result<Inbound, serde_json::Error> {
    let raw: RawFrame = serde_json::from_str(line)?;
    let frame = match raw.event.as_str() {
        "car_arrived" => Inbound::CarArrived(serde_json::from_value(raw.data)?),
        "car_departed" => Inbound::CarDeparted(serde_json::from_value(raw.data)?),
        "order_to_close_parking_lot" => Inbound::OrderToCloseParkingLot,
        "order_to_open_parking_lot" => Inbound::OrderToOpenParkingLot,
        "order_to_close_floor" => Inbound::OrderToCloseFloor(serde_json::from_value(raw.data)?),
        "order_to_open_floor" => Inbound::OrderToOpenFloor(serde_json::from_value(raw.data)?),
        "reset_parking_lot" => Inbound::ResetParkingLot,
        other => return Err(serde_json::Error::unknown_variant(other, INBOUND_EVENTS)),
    };
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn test_handshake() {
        let hs = decode_handshake(r#"{"event":"hello","client_id":"second_floor"}"#).unwrap();
        assert_eq!(hs.client_id(), Some("second_floor"));

        let hs = decode_handshake(r#"{"event":"hello"}"#).unwrap();
        assert_eq!(hs.client_id(), None);

        assert!(decode_handshake(r#"{"event":"car_arrived"}"#).is_err());
    }

    #[test]
    fn test_inbound_frames() {
        assert_eq!(
            decode(r#"{"event":"car_departed","data":{"parking_space":4,"timestamp":125}}"#)
                .unwrap(),
            Inbound::CarDeparted(SpaceReport::new(4, 125))
        );
        assert_eq!(
            decode(r#"{"event":"order_to_open_floor","data":{"client_id":"first_floor"}}"#)
                .unwrap(),
            Inbound::OrderToOpenFloor(FloorOrder {
                client_id: "first_floor".into()
            })
        );
        assert_eq!(
            decode(r#"{"event":"reset_parking_lot"}"#).unwrap(),
            Inbound::ResetParkingLot
        );
    }

    #[test]
    fn test_unit_frames_ignore_body() {
        for body in ["", r#","data":null"#, r#","data":{}"#] {
            let line = format!(r#"{{"event":"order_to_close_parking_lot"{body}}}"#);
            assert_eq!(decode(&line).unwrap(), Inbound::OrderToCloseParkingLot);
        }
        assert_eq!(
            decode(r#"{"event":"reset_parking_lot","data":null}"#).unwrap(),
            Inbound::ResetParkingLot
        );
        assert!(decode(r#"{"event":"order_to_close_floor","data":null}"#).is_err());
    }

    #[test]
    fn test_inbound_rejects_garbage() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"event":"fly_away"}"#).is_err());
        assert!(decode(r#"{"event":"car_arrived","data":{"parking_space":"x"}}"#).is_err());
    }

    #[test]
    fn test_outbound_lines() {
        let line = encode(&Outbound::Notice(&Notice::OpenParkingLot)).unwrap();
        assert_eq!(line, r#"{"event":"open_parking_lot"}"#);

        let line = error_line("unknown_identity", "who?").unwrap();
        let v: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(
            v,
            json!({"event": "error", "data": {"label": "unknown_identity", "message": "who?"}})
        );
    }
}
