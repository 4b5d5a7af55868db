//! Simulated clock contract and timestamp formats.

use crate::error::EnvError;
use chrono::NaiveDateTime;

/// Canonical simulated timestamp format, e.g. `20240213-09:30`.
pub const STAMP_FORMAT: &str = "%Y%m%d-%H:%M";

/// The simulated clock.
///
/// Time only moves when `forward` is called; there is no wall-clock coupling.
pub trait VilleClock {
    /// Current simulated time.
    fn now(&self) -> NaiveDateTime;

    /// Advances simulated time by `minutes`.
    fn forward(&self, minutes: i64);

    /// Current simulated time rendered with `format`.
    fn date(&self, format: &str) -> String {
        self.now().format(format).to_string()
    }

    /// Current simulated time in [`STAMP_FORMAT`].
    fn stamp(&self) -> String {
        self.date(STAMP_FORMAT)
    }
}

/// Parses a timestamp in [`STAMP_FORMAT`].
pub fn parse_stamp(stamp: &str) -> Result<NaiveDateTime, EnvError> {
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
        .map_err(|_| EnvError::InvalidTimestamp(stamp.to_string()))
}

/// Renders a timestamp in [`STAMP_FORMAT`].
pub fn format_stamp(time: NaiveDateTime) -> String {
    time.format(STAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_roundtrip() {
        let t = parse_stamp("20250213-11:00").unwrap();
        assert_eq!(format_stamp(t), "20250213-11:00");
    }

    #[test]
    fn test_invalid_stamp() {
        let err = parse_stamp("2025-02-13 11:00").unwrap_err();
        assert!(matches!(err, EnvError::InvalidTimestamp(s) if s == "2025-02-13 11:00"));
    }
}
