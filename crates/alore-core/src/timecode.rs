//! Time code formatting for the player's timestamp readouts

/// Time code shown when there is nothing to measure. Also the code of the
/// first frame of any stream.
pub const DEFAULT_TIMESTAMP: &str = "00:00";

/// Converts elapsed seconds to a time code.
///
/// Durations under an hour render as `MM:SS`, longer ones as `H:MM:SS`.
/// Fractional seconds are truncated. Negative, NaN or infinite input has no
/// meaningful position and yields [`DEFAULT_TIMESTAMP`].
pub fn convert_to_time_code(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return DEFAULT_TIMESTAMP.to_string();
    }

    let total = seconds as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
