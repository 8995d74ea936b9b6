//! Per-record JSON encoding.
//!
//! Each record becomes a single JSON object: the injected date field
//! first (when configured), then the original fields in wire order.
//! Serialization goes through a manual map serializer so the source
//! ordering survives; nothing is sorted or deduplicated. If the date
//! key collides with an existing field both are emitted, and parsers
//! that keep the last duplicate see the original field.

use rmpv::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::DateFormat;
use crate::date;
use crate::error::Error;
use crate::record::Record;

struct JsonRecord<'a> {
    record: &'a Record,
    date_key: Option<&'a str>,
    date_format: DateFormat,
}

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.date_key.is_some());
        let mut map = serializer.serialize_map(Some(self.record.fields.len() + extra))?;
        if let Some(key) = self.date_key {
            map.serialize_entry(key, &date::render(self.record.timestamp, self.date_format))?;
        }
        for (key, value) in &self.record.fields {
            match key {
                Value::String(s) => map.serialize_entry(s.as_str().unwrap_or_default(), value)?,
                other => map.serialize_entry(other, value)?,
            }
        }
        map.end()
    }
}

/// Renders one record as a JSON object payload.
pub fn encode_record(
    record: &Record,
    date_key: Option<&str>,
    date_format: DateFormat,
) -> Result<Vec<u8>, Error> {
    let payload = serde_json::to_vec(&JsonRecord {
        record,
        date_key,
        date_format,
    })?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Timestamp;

    fn record(secs: i64, nanos: u32, fields: Vec<(Value, Value)>) -> Record {
        Record {
            timestamp: Timestamp::new(secs, nanos),
            fields,
        }
    }

    #[test]
    fn date_key_first_then_wire_order() {
        let rec = record(
            1_700_000_000,
            0,
            vec![
                (Value::from("msg"), Value::from("hi")),
                (Value::from("n"), Value::from(1)),
            ],
        );
        let out = encode_record(&rec, Some("date"), DateFormat::Epoch).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"date":1700000000,"msg":"hi","n":1}"#
        );
    }

    #[test]
    fn no_date_key_means_no_injection() {
        let rec = record(5, 0, vec![(Value::from("msg"), Value::from("hi"))]);
        let out = encode_record(&rec, None, DateFormat::Epoch).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"msg":"hi"}"#);
    }

    #[test]
    fn iso8601_date_value() {
        let rec = record(
            1_700_000_000,
            123_456_789,
            vec![(Value::from("msg"), Value::from("hi"))],
        );
        let out = encode_record(&rec, Some("time"), DateFormat::Iso8601).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"time":"2023-11-14T22:13:20.123456Z","msg":"hi"}"#
        );
    }

    #[test]
    fn colliding_date_key_keeps_both_writes() {
        let rec = record(9, 0, vec![(Value::from("date"), Value::from("original"))]);
        let out = encode_record(&rec, Some("date"), DateFormat::Epoch).unwrap();
        // Both entries are emitted; last-occurrence parsers see the
        // original field.
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"date":9,"date":"original"}"#
        );
    }

    #[test]
    fn nested_values_survive() {
        let rec = record(
            1,
            0,
            vec![(
                Value::from("ctx"),
                Value::Map(vec![(Value::from("a"), Value::from(true))]),
            )],
        );
        let out = encode_record(&rec, None, DateFormat::Epoch).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"ctx":{"a":true}}"#);
    }
}
