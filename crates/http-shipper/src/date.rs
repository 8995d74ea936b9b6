//! Rendering of the injected date field.

use chrono::DateTime;
use serde_json::Value;

use crate::config::DateFormat;
use crate::record::Timestamp;

/// Renders a record timestamp as the configured date value.
#[must_use]
pub fn render(ts: Timestamp, format: DateFormat) -> Value {
    match format {
        DateFormat::Epoch => Value::from(ts.secs),
        DateFormat::Double => Value::from(ts.as_f64()),
        DateFormat::Iso8601 => Value::from(to_iso8601(ts)),
    }
}

/// UTC ISO-8601 with exactly six sub-second digits.
///
/// Nanoseconds are truncated to microseconds, not rounded.
#[must_use]
pub fn to_iso8601(ts: Timestamp) -> String {
    let date = DateTime::from_timestamp(ts.secs, ts.nanos).unwrap_or_default();
    let micros = ts.nanos / 1_000;
    format!("{}.{micros:06}Z", date.format("%Y-%m-%dT%H:%M:%S"))
}
