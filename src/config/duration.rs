//! Human-readable durations used by the `health` settings ("2s", "500ms", "10m").

use std::time::Duration;

/// Parse a duration string made of an integer and an optional unit.
///
/// Units: `ms`, `s`, `m`, `h`. A bare integer is read as seconds.
/// Returns `None` for empty input, unknown units, or negative values.
///
/// ```
/// use supabase_git_sync::config::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
/// assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
/// assert_eq!(parse_duration("10m"), Some(Duration::from_secs(600)));
/// ```
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);
    if digits.is_empty() {
        return None;
    }
    let value: u64 = digits.parse().ok()?;

    match unit.trim() {
        "" | "s" => Some(Duration::from_secs(value)),
        "ms" => Some(Duration::from_millis(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        "h" => value.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}
