//! Streaming decoder for msgpack-framed record batches.
//!
//! A batch is a concatenation of msgpack values, each expected to be
//! a 2-element array `[timestamp, field-map]`. Units that do not
//! match that shape are skipped; only broken framing (a truncated or
//! corrupt value) stops decoding.

use rmpv::Value;
use std::io::Cursor;

use crate::error::Error;

/// Event time with second and nanosecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: u32,
}

impl Timestamp {
    #[must_use]
    pub fn new(secs: i64, nanos: u32) -> Self {
        Timestamp { secs, nanos }
    }

    /// Seconds plus sub-second fraction as a double.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.secs as f64 + f64::from(self.nanos) / 1e9
    }

    /// Extracts a timestamp from the head element of a decoded unit.
    ///
    /// Accepted forms, matching what shippers put on the wire:
    /// integer seconds, float seconds, the 8-byte event-time ext
    /// (type 0, big-endian seconds then nanoseconds), and the nested
    /// `[time, metadata]` header whose first element is unwrapped.
    /// Anything else decodes as the zero timestamp; the record is
    /// still delivered.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Integer(n) => {
                let secs = n.as_i64().unwrap_or_default();
                Timestamp::new(secs, 0)
            }
            Value::F32(f) => Timestamp::from_seconds(f64::from(*f)),
            Value::F64(f) => Timestamp::from_seconds(*f),
            Value::Ext(0, bytes) if bytes.len() == 8 => {
                let secs = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                let nanos = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
                Timestamp::new(i64::from(secs), nanos)
            }
            Value::Array(parts) => parts
                .first()
                .map(Timestamp::from_value)
                .unwrap_or_default(),
            _ => Timestamp::default(),
        }
    }

    fn from_seconds(seconds: f64) -> Self {
        if !seconds.is_finite() || seconds < 0.0 {
            return Timestamp::default();
        }
        let secs = seconds.trunc();
        let nanos = ((seconds - secs) * 1e9) as u32;
        Timestamp::new(secs as i64, nanos.min(999_999_999))
    }
}

/// One decoded log event: a timestamp and its fields in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: Timestamp,
    /// Key/value pairs exactly as they appeared in the batch.
    pub fields: Vec<(Value, Value)>,
}

/// Single forward pass over a batch buffer.
///
/// The iterator never mutates the source, so decoding is restartable
/// from the beginning by constructing a new decoder over the same
/// bytes.
pub struct RecordDecoder<'a> {
    data: &'a [u8],
    cursor: Cursor<&'a [u8]>,
}

impl<'a> RecordDecoder<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        RecordDecoder {
            data,
            cursor: Cursor::new(data),
        }
    }
}

impl Iterator for RecordDecoder<'_> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cursor.position() >= self.data.len() as u64 {
                return None;
            }
            let unit = match rmpv::decode::read_value(&mut self.cursor) {
                Ok(value) => value,
                Err(e) => return Some(Err(Error::Decode(e))),
            };

            // Each unit must be [timestamp, map]; anything else is
            // filtered out, not an error.
            let Value::Array(mut parts) = unit else {
                continue;
            };
            if parts.len() != 2 {
                continue;
            }
            let Some(Value::Map(fields)) = parts.pop() else {
                continue;
            };
            let timestamp = Timestamp::from_value(&parts[0]);
            return Some(Ok(Record { timestamp, fields }));
        }
    }
}
