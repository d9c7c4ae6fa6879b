//! Serde helpers for `RelayConfig`

/// Timeouts in `~/.plandrop/config.toml` are whole seconds, e.g.
/// `exec_timeout = 10` or `control_persist = 60`.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(timeout: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(timeout.as_secs())
    }

    /// Negative or fractional values are rejected by the u64 parse
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
