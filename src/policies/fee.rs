//! # Departure fee.
//!
//! [`FeeCalculator`] charges a fixed rate per **whole** elapsed minute. Partial minutes
//! are truncated, never rounded:
//!
//! ```text
//! arrived=0   departed=59   → 0 min → 0.00
//! arrived=0   departed=125  → 2 min → 0.20   (rate 0.1/min)
//! arrived=10  departed=5    → InvalidInterval
//! ```
//!
//! Amounts are kept in integer hundredths of a currency unit.

use std::fmt;

use serde::Serialize;

use crate::error::ReportError;

/// Amount owed, in hundredths of a currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Fee(u64);

impl Fee {
    #[inline]
    pub fn from_hundredths(hundredths: u64) -> Self {
        Self(hundredths)
    }

    #[inline]
    pub fn hundredths(&self) -> u64 {
        self.0
    }

    /// Amount as a floating-point number of currency units (display only).
    #[inline]
    pub fn as_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Fee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Per-minute pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCalculator {
    rate: u64,
}

impl FeeCalculator {
    /// Rate used by [`Default`]: 0.1 unit per minute.
    pub const DEFAULT_RATE: u64 = 10;

    /// Creates a calculator charging `rate` hundredths per whole minute.
    pub fn new(rate: u64) -> Self {
        Self { rate }
    }

    #[inline]
    pub fn rate(&self) -> u64 {
        self.rate
    }

    /// Computes the fee for a stay between two timestamps (seconds).
    pub fn calculate(&self, arrived_at: i64, departed_at: i64) -> Result<Fee, ReportError> {
        if departed_at < arrived_at {
            return Err(ReportError::InvalidInterval {
                arrived_at,
                departed_at,
            });
        }
        let minutes = departed_at.abs_diff(arrived_at) / 60;
        Ok(Fee(minutes.saturating_mul(self.rate)))
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RATE)
    }
}
