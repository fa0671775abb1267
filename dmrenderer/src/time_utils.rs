//! Time formatting and parsing for AVTransport time strings.
//!
//! AVTransport positions and durations use `H:MM:SS`: unpadded hours,
//! two-digit minutes and seconds.

use thiserror::Error;

/// Placeholder used before any duration or position is known.
pub const ZERO_TIME: &str = "00:00:00";

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid time format '{0}': expected H:MM:SS")]
pub struct TimeFormatError(pub String);

/// Formats a duration in seconds as `H:MM:SS`.
///
/// # Examples
/// ```
/// # use dmrenderer::time_utils::format_time;
/// assert_eq!(format_time(0), "0:00:00");
/// assert_eq!(format_time(90), "0:01:30");
/// assert_eq!(format_time(36061), "10:01:01");
/// ```
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, secs)
}

/// Formats a millisecond position as `H:MM:SS`, truncating sub-second parts.
pub fn format_time_ms(milliseconds: u64) -> String {
    format_time(milliseconds / 1000)
}

/// Parses an `H:MM:SS` string to seconds.
///
/// Exactly three colon-separated integer fields are required. Field values
/// are not range checked: `"0:75:00"` is 4500 seconds.
pub fn parse_time(input: &str) -> Result<u64, TimeFormatError> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(TimeFormatError(input.to_string()));
    }

    let mut total = 0u64;
    for part in parts {
        total = part
            .parse::<u64>()
            .ok()
            .and_then(|value| total.checked_mul(60)?.checked_add(value))
            .ok_or_else(|| TimeFormatError(input.to_string()))?;
    }

    Ok(total)
}
