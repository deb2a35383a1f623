//! Wire-facing data transfer objects for REST and WebSocket payloads.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Admin REST request/response payloads.
pub mod admin;
/// Game state projections shared by REST and WebSocket layers.
pub mod game;
/// Health endpoint payloads.
pub mod health;
/// Public registration payloads.
pub mod public;
/// Validation helpers for DTOs.
pub mod validation;
/// WebSocket message envelopes.
pub mod ws;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Render a millisecond duration as `m:ss.cc` for leaderboard display.
pub(crate) fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1_000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let centis = (ms % 1_000) / 10;
    format!("{minutes}:{seconds:02}.{centis:02}")
}

#[cfg(test)]
mod tests {
    use super::format_duration;

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(0), "0:00.00");
        assert_eq!(format_duration(305), "0:00.30");
        assert_eq!(format_duration(61_230), "1:01.23");
        assert_eq!(format_duration(600_000), "10:00.00");
    }
}
