//! Sequential HTTP delivery stage for batches of log records.
//!
//! This crate is the last hop of a log-shipping pipeline: it takes a
//! batch of msgpack-framed `[timestamp, record]` units that some
//! upstream stage buffered, re-encodes them for the wire, and POSTs
//! them to a remote HTTP collector.
//!
//! ```text
//!   batch bytes ──> RecordDecoder ──> per-record (time, fields)
//!                                          │
//!                          date injection + format encoding
//!                                          │
//!                                    DeliveryClient ──> HTTP POST
//!                                          │
//!                              Outcome ──> verdict (max fold)
//! ```
//!
//! The defining behavior is the per-record JSON path: instead of one
//! batched array request, every record becomes its own HTTP request,
//! issued strictly in decode order. That isolates a single rejected
//! record's failure and gives each record a distinct HTTP outcome, at
//! the cost of batch throughput. GELF and raw msgpack keep the
//! conventional one-request-per-batch shape.
//!
//! A flush never fails at the type level: [`Flusher::flush`] always
//! returns an [`Outcome`], the caller's cue to drop, retry, or
//! account the batch as delivered. Retrying resends the entire batch;
//! there is no partial-success bookkeeping.

pub mod client;
pub mod config;
pub mod date;
pub mod error;
pub mod flusher;
pub mod gelf;
pub mod json;
pub mod outcome;
pub mod record;

pub use config::{Compression, DateFormat, DeliverySettings, GelfFieldMapping, OutputFormat};
pub use error::Error;
pub use flusher::Flusher;
pub use outcome::Outcome;
pub use record::{Record, RecordDecoder, Timestamp};
