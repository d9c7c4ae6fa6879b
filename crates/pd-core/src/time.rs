//! Time formatting helpers

use chrono::{DateTime, Local};

/// Format a Unix timestamp (seconds) as local `YYYY-MM-DD HH:MM:SS`.
///
/// Returns None for timestamps chrono cannot represent.
pub fn format_unix_secs(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(|utc| {
        utc.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_shape() {
        let formatted = format_unix_secs(1_700_000_000).unwrap();
        assert_eq!(formatted.len(), "2023-11-14 22:13:20".len());
        assert_eq!(&formatted[4..5], "-");
        assert_eq!(&formatted[10..11], " ");
    }

    #[test]
    fn test_out_of_range() {
        assert!(format_unix_secs(i64::MAX).is_none());
    }
}
