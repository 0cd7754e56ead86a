//! Output formatting and display utilities
//!
//! Status lines go to stderr so that secrets and tokens on stdout can be piped.

use colored::Colorize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use vestibule::SessionPayload;

/// Print a success message
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", msg.bold().underline());
}

/// Print a decoded session payload
pub fn print_payload(payload: &SessionPayload, now_millis: i64) {
    header("Session");

    field("user", &payload.user.id);
    if let Some(email) = &payload.user.email {
        field("email", email);
    }
    if let Some(name) = &payload.user.name {
        field("name", name);
    }
    if !payload.user.roles.is_empty() {
        field("roles", &payload.user.roles.join(", "));
    }
    field("issued", &format_timestamp(payload.issued_at));
    field("expires", &format_timestamp(payload.expires_at));
    field(
        "remaining",
        &format_duration((payload.remaining_millis(now_millis) / 1000) as u64),
    );
    field("version", &payload.version.to_string());
    println!();
}

fn field(label: &str, value: &str) {
    println!("  {:<10} {}", format!("{}:", label).dimmed(), value);
}

/// RFC 3339 rendering of a millisecond timestamp
pub fn format_timestamp(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| millis.to_string())
}

/// Format a duration in human-readable form
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86_400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3600)
    }
}

/// Print a JSON value
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3 * 3600 + 120), "3h 2m");
        assert_eq!(format_duration(86_400 + 3600), "1d 1h");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14T22:13:20Z");
    }
}
