//! Parsing of human-readable configuration values

use std::time::Duration;

/// Parse a duration string such as `"100ms"`, `"30s"`, `"5m"`, `"1h"` or `"1d"`.
///
/// A bare number is read as seconds. Returns `None` for anything else, including
/// negative or overflowing values; callers decide whether that is fatal.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim().to_lowercase();
    let (num_str, unit_ms): (&str, u64) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60 * 1_000)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 60 * 60 * 1_000)
    } else if let Some(n) = s.strip_suffix('d') {
        (n, 24 * 60 * 60 * 1_000)
    } else {
        (s.as_str(), 1_000)
    };

    let n: u64 = num_str.trim().parse().ok()?;
    n.checked_mul(unit_ms).map(Duration::from_millis)
}
