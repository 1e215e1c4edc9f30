use std::collections::BTreeMap;

use sprout_core::types::Floor;

/// Default API root of the booking service.
pub const DEFAULT_API_URL: &str = "https://app.desk.ly/en/api/v2";

/// Booking service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub api_url: String,
    /// Sent verbatim in the `Authorization` header.
    pub api_key: String,
    /// Site identifier every booking query is scoped to.
    pub location_id: String,
    /// Floor number -> booking service floor id (used for bookings).
    pub floor_ids: BTreeMap<Floor, String>,
    /// Floor number -> booking service room id (used for resources).
    pub room_ids: BTreeMap<Floor, String>,
}

impl BookingConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var               | Default                          |
    /// |-----------------------|----------------------------------|
    /// | `BOOKING_API_URL`     | `https://app.desk.ly/en/api/v2`  |
    /// | `BOOKING_API_KEY`     | empty                            |
    /// | `BOOKING_LOCATION_ID` | empty                            |
    /// | `FLOOR_IDS`           | empty (`1:abc,2:def`)            |
    /// | `FLOOR_ROOM_IDS`      | empty (`1:room-a,2:room-b`)      |
    pub fn from_env() -> Self {
        let env = |key: &str| std::env::var(key).unwrap_or_default();

        let api_url = std::env::var("BOOKING_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: env("BOOKING_API_KEY"),
            location_id: env("BOOKING_LOCATION_ID"),
            floor_ids: parse_floor_map(&env("FLOOR_IDS")),
            room_ids: parse_floor_map(&env("FLOOR_ROOM_IDS")),
        }
    }
}

/// Parse `floor:id` pairs separated by commas. Malformed entries are
/// skipped with a warning.
pub fn parse_floor_map(raw: &str) -> BTreeMap<Floor, String> {
    let mut map = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let parsed = entry
            .split_once(':')
            .and_then(|(floor, id)| Some((floor.trim().parse::<Floor>().ok()?, id.trim())))
            .filter(|(_, id)| !id.is_empty());
        match parsed {
            Some((floor, id)) => {
                map.insert(floor, id.to_string());
            }
            None => tracing::warn!(entry, "Ignoring malformed floor mapping"),
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_trims() {
        let map = parse_floor_map(" 1:abc , 2: def,3:ghi ");
        assert_eq!(map.len(), 3);
        assert_eq!(map[&1], "abc");
        assert_eq!(map[&2], "def");
    }

    #[test]
    fn skips_malformed_entries() {
        let map = parse_floor_map("x:abc,2,3:,4:ok");
        assert_eq!(map.into_iter().collect::<Vec<_>>(), vec![(4, "ok".to_string())]);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(parse_floor_map("").is_empty());
    }
}
