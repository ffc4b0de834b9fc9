//! # Station identities.
//!
//! Every floor has exactly one reporting station. [`StationIdentity`] is the single
//! source of truth for the mapping between wire names, floor indexes and enum values:
//!
//! ```text
//! wire name        variant   floor
//! ground_floor     Ground    0
//! first_floor      First     1
//! second_floor     Second    2
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Logical identity of a floor station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StationIdentity {
    #[serde(rename = "ground_floor")]
    Ground,
    #[serde(rename = "first_floor")]
    First,
    #[serde(rename = "second_floor")]
    Second,
}

const TABLE: [(StationIdentity, &str); 3] = [
    (StationIdentity::Ground, "ground_floor"),
    (StationIdentity::First, "first_floor"),
    (StationIdentity::Second, "second_floor"),
];

impl StationIdentity {
    /// All identities in floor order.
    pub const ALL: [StationIdentity; 3] = [
        StationIdentity::Ground,
        StationIdentity::First,
        StationIdentity::Second,
    ];

    /// Floor index served by this station.
    #[inline]
    pub fn floor(self) -> usize {
        self as usize
    }

    /// Station serving `floor`, if any.
    pub fn from_floor(floor: usize) -> Option<Self> {
        Self::ALL.get(floor).copied()
    }

    /// Wire name (also the name of the station's group).
    pub fn as_str(self) -> &'static str {
        TABLE[self.floor()].1
    }

    /// Resolves the identity header supplied at connect time.
    ///
    /// A missing or unrecognized value is an [`ReportError::InvalidIdentityHeader`].
    pub fn from_header(value: Option<&str>) -> Result<Self, ReportError> {
        let raw = value.map(str::trim);
        raw.and_then(|v| TABLE.iter().find(|(_, name)| *name == v).map(|(id, _)| *id))
            .ok_or_else(|| ReportError::InvalidIdentityHeader {
                value: value.map(str::to_string),
            })
    }

    /// Iterates identities in floor order.
    pub fn iter() -> impl Iterator<Item = StationIdentity> {
        Self::ALL.into_iter()
    }
}

impl FromStr for StationIdentity {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_header(Some(s))
    }
}

impl fmt::Display for StationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_bidirectional() {
        for (floor, id) in StationIdentity::iter().enumerate() {
            assert_eq!(id.floor(), floor);
            assert_eq!(StationIdentity::from_floor(floor), Some(id));
            assert_eq!(id.as_str().parse::<StationIdentity>().unwrap(), id);
        }
        assert_eq!(StationIdentity::from_floor(3), None);
    }

    #[test]
    fn test_header_parsing() {
        assert_eq!(
            StationIdentity::from_header(Some("first_floor")).unwrap(),
            StationIdentity::First
        );
        assert_eq!(
            StationIdentity::from_header(Some(" second_floor ")).unwrap(),
            StationIdentity::Second
        );
        assert_eq!(
            StationIdentity::from_header(Some("rooftop")).unwrap_err(),
            ReportError::InvalidIdentityHeader {
                value: Some("rooftop".into())
            }
        );
        assert_eq!(
            StationIdentity::from_header(None).unwrap_err(),
            ReportError::InvalidIdentityHeader { value: None }
        );
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&StationIdentity::Ground).unwrap();
        assert_eq!(json, "\"ground_floor\"");
        let id: StationIdentity = serde_json::from_str("\"second_floor\"").unwrap();
        assert_eq!(id, StationIdentity::Second);
    }
}
