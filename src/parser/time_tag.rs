use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;

static TIME_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)#time "([^"]+)""#).expect("valid time tag pattern"));

static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*(second|minute|hour|day)s?\s+(ago|from now)\s*$")
        .expect("valid relative time pattern")
});

static HUMANTIME_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(.+?)\s+(ago|from now)\s*$").expect("valid duration pattern")
});

/// Resolve the focal time of a message.
///
/// Returns `(timestamp, true)` when the text carries a `#time "<description>"`
/// tag that can be understood, otherwise `(message_timestamp, false)`.
/// Relative descriptions are offsets from the message timestamp.
pub fn parse_time_tag(text: &str, message_timestamp: i64) -> (i64, bool) {
    let Some(description) = TIME_TAG.captures(text).and_then(|c| c.get(1)) else {
        return (message_timestamp, false);
    };
    let description = description.as_str();

    match relative_offset(description)
        .and_then(|offset| message_timestamp.checked_add(offset))
        .or_else(|| free_form(description, message_timestamp))
        .filter(|ts| DateTime::from_timestamp(*ts, 0).is_some())
    {
        Some(timestamp) => (timestamp, true),
        None => {
            log::debug!("Ignoring unparsable time tag {:?}", description);
            (message_timestamp, false)
        }
    }
}

/// `<number> (second|minute|hour|day)s? (ago|from now)`
fn relative_offset(description: &str) -> Option<i64> {
    let caps = RELATIVE.captures(description)?;
    let amount: f64 = caps[1].parse().ok()?;
    let unit = match caps[2].to_ascii_lowercase().as_str() {
        "second" => 1.0,
        "minute" => 60.0,
        "hour" => 3600.0,
        "day" => 86400.0,
        _ => return None,
    };
    let seconds = (amount * unit).round();
    if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
        return None;
    }
    let offset = seconds as i64;
    Some(if caps[3].eq_ignore_ascii_case("ago") {
        -offset
    } else {
        offset
    })
}

/// An RFC 3339 instant, or a humantime span such as `1h 30m ago`.
fn free_form(description: &str, message_timestamp: i64) -> Option<i64> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(description.trim()) {
        return Some(instant.timestamp());
    }

    let caps = HUMANTIME_RELATIVE.captures(description)?;
    let span = humantime::parse_duration(caps[1].trim()).ok()?;
    let offset = i64::try_from(span.as_secs()).ok()?;
    if caps[2].eq_ignore_ascii_case("ago") {
        message_timestamp.checked_sub(offset)
    } else {
        message_timestamp.checked_add(offset)
    }
}
