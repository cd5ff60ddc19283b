//! Sample station records for seeding and integration tests.
//!
//! A small slice of the CTA line data in the shape the upstream
//! change-data-capture connector emits, covering all three lines plus one
//! record with no line flag set to exercise the data-quality path.

use station_types::StationRaw;

fn station(
    stop_id: i64,
    station_id: i64,
    order: i64,
    name: &str,
    red: bool,
    blue: bool,
    green: bool,
) -> StationRaw {
    StationRaw {
        stop_id,
        direction_id: "N".to_string(),
        stop_name: name.to_string(),
        station_name: name.to_string(),
        station_descriptive_name: format!("{name} (CTA)"),
        station_id,
        order,
        red,
        blue,
        green,
    }
}

/// Sample stations, one record per stop, in service order.
pub fn sample_stations() -> Vec<StationRaw> {
    vec![
        station(30173, 40900, 0, "Howard", true, false, false),
        station(30237, 41190, 1, "Jarvis", true, false, false),
        station(30171, 40820, 2, "O'Hare", false, true, false),
        station(30374, 40890, 3, "Rosemont", false, true, false),
        station(30057, 40380, 4, "Clark/Lake", false, false, true),
        station(30004, 40830, 5, "Ashland/63rd", false, false, true),
    ]
}

/// A record violating the one-line invariant: no flag set.
pub fn flagless_station() -> StationRaw {
    station(30999, 49999, 99, "Ghost Stop", false, false, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use station_types::Line;

    #[test]
    fn test_sample_stations_cover_all_lines() {
        let lines: Vec<Line> = sample_stations()
            .iter()
            .map(|s| s.derive().unwrap().line)
            .collect();

        assert!(lines.contains(&Line::Red));
        assert!(lines.contains(&Line::Blue));
        assert!(lines.contains(&Line::Green));
    }

    #[test]
    fn test_sample_stations_have_unique_ids() {
        let stations = sample_stations();
        let mut ids: Vec<i64> = stations.iter().map(|s| s.station_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), stations.len());
    }

    #[test]
    fn test_flagless_station_fails_derivation() {
        assert!(flagless_station().derive().is_err());
    }
}
