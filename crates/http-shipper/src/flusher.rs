//! Batch orchestration.
//!
//! One [`Flusher::flush`] call handles one batch end to end: decode,
//! encode per the configured format, deliver, and reduce per-request
//! outcomes into a single batch verdict. Deliveries are strictly
//! sequential in decode order, so requests for records of the same
//! tag reach the collector in source order.

use std::sync::Arc;
use tracing::{debug, error};

use crate::client::DeliveryClient;
use crate::config::{DeliverySettings, OutputFormat};
use crate::error::Error;
use crate::gelf;
use crate::json;
use crate::outcome::Outcome;
use crate::record::RecordDecoder;

/// Drives the delivery of record batches to one collector endpoint.
///
/// Holds the resolved settings and the HTTP client for the lifetime
/// of the output instance; a flush never mutates shared state, so a
/// host may run flushes for different batches concurrently on clones
/// of the same flusher.
#[derive(Debug, Clone)]
pub struct Flusher {
    settings: Arc<DeliverySettings>,
    client: DeliveryClient,
}

impl Flusher {
    /// Builds a flusher, validating the settings up front.
    pub fn new(settings: DeliverySettings) -> Result<Self, Error> {
        let settings = Arc::new(settings);
        let client = DeliveryClient::new(Arc::clone(&settings))?;
        Ok(Flusher { settings, client })
    }

    #[must_use]
    pub fn settings(&self) -> &DeliverySettings {
        &self.settings
    }

    /// Delivers one batch and returns its verdict.
    ///
    /// Infallible at the type level: every decode, encode and
    /// transport failure is folded into the returned [`Outcome`].
    /// A verdict of `Retry` or `Error` covers the whole batch; a
    /// caller that retries will resend every record, including ones
    /// already accepted.
    pub async fn flush(&self, data: &[u8], tag: &[u8]) -> Outcome {
        match self.settings.format {
            OutputFormat::Gelf => self.flush_gelf(data, tag).await,
            OutputFormat::Msgpack => {
                // Raw passthrough: the batch bytes go out unmodified
                // and the decoder is bypassed entirely.
                self.client
                    .deliver(data, self.settings.format.content_type(), tag)
                    .await
            }
            _ => self.flush_per_record(data, tag).await,
        }
    }

    /// JSON path: one request per record, monotonic-max verdict.
    ///
    /// A batch that decodes to zero usable records is an error, not a
    /// successful no-op; the caller treats it like any other failed
    /// chunk.
    async fn flush_per_record(&self, data: &[u8], tag: &[u8]) -> Outcome {
        let date_key = self.settings.json_date_key.as_deref();
        let date_format = self.settings.json_date_format;
        let content_type = self.settings.format.content_type();

        let mut verdict = Outcome::Ok;
        let mut records = 0usize;
        for item in RecordDecoder::new(data) {
            let record = match item {
                Ok(record) => record,
                Err(e) => {
                    error!("{e}");
                    return Outcome::Error;
                }
            };
            records += 1;

            let payload = match json::encode_record(&record, date_key, date_format) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("{e}");
                    return Outcome::Error;
                }
            };

            let outcome = self.client.deliver(&payload, content_type, tag).await;
            verdict = verdict.merge(outcome);
        }

        if records == 0 {
            error!(
                "no records in batch for {}:{}",
                self.settings.host, self.settings.port
            );
            return Outcome::Error;
        }
        debug!("delivered {records} records sequentially, verdict {verdict:?}");
        verdict
    }

    /// GELF path: one encode and one request for the whole batch.
    async fn flush_gelf(&self, data: &[u8], tag: &[u8]) -> Outcome {
        let payload = match gelf::encode_batch(data, &self.settings.gelf) {
            Ok(payload) => payload,
            Err(e) => {
                error!("{e}");
                return Outcome::Error;
            }
        };
        self.client
            .deliver(&payload, self.settings.format.content_type(), tag)
            .await
    }
}
