//! In-memory materialized view of stations.
//!
//! The table is a cache of its changelog, never the source of truth: it is
//! rebuilt on startup by folding replayed changelog entries in order, and
//! mutated only by the transform agent afterwards.

use std::collections::HashMap;

use station_types::StationDerived;

/// Keyed mapping from `station_id` to the latest derived record observed
/// for that station.
#[derive(Debug, Default)]
pub struct StationTable {
    entries: HashMap<i64, StationDerived>,
}

impl StationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the table by folding replayed changelog entries, oldest
    /// first. Later entries for the same key win.
    pub fn rebuild(entries: impl IntoIterator<Item = (i64, StationDerived)>) -> Self {
        let mut table = Self::new();
        for (station_id, station) in entries {
            table.entries.insert(station_id, station);
        }
        table
    }

    /// Insert or replace the entry for the station.
    pub fn upsert(&mut self, station: StationDerived) {
        self.entries.insert(station.station_id, station);
    }

    /// Look up the latest derived record for a station.
    pub fn get(&self, station_id: i64) -> Option<&StationDerived> {
        self.entries.get(&station_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
