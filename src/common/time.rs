//! Time helpers for message timestamps.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as an RFC 3339 string (second precision).
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn timestamp_round_trips_through_rfc3339() {
        let stamp = now_rfc3339();
        assert!(DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
