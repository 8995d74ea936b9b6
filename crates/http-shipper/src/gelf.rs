//! Batch GELF encoding.
//!
//! Translates every record of a batch into a GELF 1.1 object using
//! the configured field-name mapping and appends the serialized
//! objects, newline-terminated, into one buffer. The whole buffer is
//! delivered as a single payload. Any record that cannot be mapped
//! onto the schema aborts the batch.

use rmpv::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;

use crate::config::GelfFieldMapping;
use crate::error::Error;
use crate::record::{Record, RecordDecoder, Timestamp};

const GELF_VERSION: &str = "1.1";

/// Encodes a whole batch as newline-delimited GELF.
///
/// The output buffer is pre-sized at 1.5x the input length; JSON
/// rendering of msgpack rarely exceeds that, and the buffer grows on
/// demand when it does.
pub fn encode_batch(data: &[u8], mapping: &GelfFieldMapping) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 2);
    for item in RecordDecoder::new(data) {
        let record = item?;
        let object = GelfObject(translate(&record, mapping)?);
        serde_json::to_writer(&mut out, &object)?;
        out.push(b'\n');
    }
    Ok(out)
}

struct GelfObject(Vec<(String, JsonValue)>);

impl Serialize for GelfObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn translate(
    record: &Record,
    mapping: &GelfFieldMapping,
) -> Result<Vec<(String, JsonValue)>, Error> {
    let mut timestamp = None;
    let mut host = None;
    let mut short_message = None;
    let mut full_message = None;
    let mut level = None;
    let mut extras = Vec::new();

    for (key, value) in &record.fields {
        let Some(name) = key.as_str() else {
            continue;
        };
        if name == mapping.timestamp_key() {
            timestamp = numeric_seconds(value);
        } else if name == mapping.host_key() {
            host = stringify(value);
        } else if name == mapping.short_message_key() {
            short_message = Some(stringify(value).ok_or_else(|| {
                Error::Gelf(format!("'{name}' field is not a scalar message"))
            })?);
        } else if name == mapping.full_message_key() {
            full_message = stringify(value);
        } else if name == mapping.level_key() {
            level = Some(parse_level(value)?);
        } else if name == "id" {
            // Reserved by the GELF schema; collectors reject it.
            continue;
        } else {
            extras.push((format!("_{name}"), serde_json::to_value(value)?));
        }
    }

    let short_message = short_message.ok_or_else(|| {
        Error::Gelf(format!(
            "record has no '{}' field",
            mapping.short_message_key()
        ))
    })?;

    let mut object = Vec::with_capacity(extras.len() + 6);
    object.push(("version".to_string(), JsonValue::from(GELF_VERSION)));
    if let Some(host) = host {
        object.push(("host".to_string(), JsonValue::from(host)));
    }
    object.push(("short_message".to_string(), JsonValue::from(short_message)));
    if let Some(full) = full_message {
        object.push(("full_message".to_string(), JsonValue::from(full)));
    }
    object.push((
        "timestamp".to_string(),
        JsonValue::from(timestamp.unwrap_or_else(|| record.timestamp.as_f64())),
    ));
    if let Some(level) = level {
        object.push(("level".to_string(), JsonValue::from(level)));
    }
    object.extend(extras);
    Ok(object)
}

fn numeric_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => n.as_f64(),
        Value::F32(f) => Some(f64::from(*f)),
        Value::F64(f) => Some(*f),
        Value::Ext(..) | Value::Array(_) => Some(Timestamp::from_value(value).as_f64()),
        _ => None,
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => s.as_str().map(str::to_string),
        Value::Integer(n) => Some(n.to_string()),
        Value::F32(f) => Some(f.to_string()),
        Value::F64(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Syslog severity, 0 through 7, as an integer or a numeric string.
fn parse_level(value: &Value) -> Result<u8, Error> {
    let level = match value {
        Value::Integer(n) => n.as_u64().filter(|v| *v <= 7).map(|v| v as u8),
        Value::String(s) => s
            .as_str()
            .and_then(|s| s.trim().parse::<u8>().ok())
            .filter(|v| *v <= 7),
        _ => None,
    };
    level.ok_or_else(|| Error::Gelf(format!("invalid level value {value}")))
}
