//! Shared record types for the station pipeline.
//!
//! `StationRaw` is the change-data-capture record produced upstream for the
//! `stations` topic. `StationDerived` is the simplified record the transform
//! agent republishes, with the per-line boolean flags collapsed into a single
//! `Line` label.
//!
//! This crate defines the shared types only; producing and consuming them is
//! the job of the publisher and agent crates, which both depend on this one.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw station record as emitted by the upstream change-data-capture
/// connector.
///
/// At most one of `red`/`blue`/`green` is expected to be true. A record with
/// none of them set cannot be assigned a line and fails derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRaw {
    pub stop_id: i64,
    pub direction_id: String,
    pub stop_name: String,
    pub station_name: String,
    pub station_descriptive_name: String,
    pub station_id: i64,
    pub order: i64,
    pub red: bool,
    pub blue: bool,
    pub green: bool,
}

/// Line label derived from the boolean flags of a [`StationRaw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Line {
    Red,
    Blue,
    Green,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Red => write!(f, "red"),
            Line::Blue => write!(f, "blue"),
            Line::Green => write!(f, "green"),
        }
    }
}

/// Simplified station record republished to the processed-stations topic and
/// materialized in the station table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDerived {
    pub station_id: i64,
    pub station_name: String,
    pub order: i64,
    pub line: Line,
}

/// Errors raised while deriving a [`StationDerived`] from a [`StationRaw`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DerivationError {
    #[error("station {station_id} has none of the red/blue/green flags set")]
    NoLineFlagSet { station_id: i64 },
}

impl StationRaw {
    /// Derive the simplified record for this station.
    ///
    /// The line is `red` if the `red` flag is set, else `blue` if `blue` is
    /// set, else `green` if `green` is set. A record with no flag set is a
    /// data-quality error and is reported rather than guessed at.
    pub fn derive(&self) -> Result<StationDerived, DerivationError> {
        let line = if self.red {
            Line::Red
        } else if self.blue {
            Line::Blue
        } else if self.green {
            Line::Green
        } else {
            return Err(DerivationError::NoLineFlagSet {
                station_id: self.station_id,
            });
        };

        Ok(StationDerived {
            station_id: self.station_id,
            station_name: self.station_name.clone(),
            order: self.order,
            line,
        })
    }
}
