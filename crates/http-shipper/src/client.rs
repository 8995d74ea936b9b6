//! HTTP delivery of an encoded payload.
//!
//! One [`DeliveryClient`] wraps a reqwest client configured from the
//! delivery settings (timeout, optional proxy) and turns every POST
//! into a classified [`Outcome`]. Compression failures degrade to an
//! uncompressed request; transport failures classify as `Retry`.

use flate2::write::GzEncoder;
use flate2::Compression as GzipLevel;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT};
use std::io::Write;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{Compression, DeliverySettings};
use crate::error::Error;
use crate::outcome::Outcome;

const USER_AGENT_VALUE: &str = "http-shipper";

/// Maps a completed HTTP exchange onto an outcome.
///
/// 200-205 is the accepted window; 4xx is unrecoverable by remote
/// policy; everything else (3xx, stray 2xx, 5xx) is worth retrying.
#[must_use]
pub fn classify_status(status: u16) -> Outcome {
    match status {
        200..=205 => Outcome::Ok,
        400..=499 => Outcome::Error,
        _ => Outcome::Retry,
    }
}

/// Sends encoded payloads to the configured collector.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    settings: Arc<DeliverySettings>,
    endpoint: String,
    /// Headers that are identical for every request: static headers
    /// plus the fixed user agent.
    base_headers: HeaderMap,
}

impl DeliveryClient {
    pub fn new(settings: Arc<DeliverySettings>) -> Result<Self, Error> {
        let client = build_client(&settings)?;
        let base_headers = build_static_headers(&settings)?;
        let endpoint = settings.endpoint();
        Ok(DeliveryClient {
            client,
            settings,
            endpoint,
            base_headers,
        })
    }

    /// POSTs one payload and classifies the result.
    ///
    /// Never fails at the type level: every failure mode folds into
    /// the returned outcome. The payload is borrowed and left
    /// untouched; compression writes into a fresh buffer.
    pub async fn deliver(&self, payload: &[u8], content_type: &'static str, tag: &[u8]) -> Outcome {
        let (body, compressed) = match self.settings.compress {
            Compression::Gzip => match gzip(payload) {
                Ok(buf) => (buf, true),
                Err(e) => {
                    error!("cannot gzip payload, sending uncompressed: {e}");
                    (payload.to_vec(), false)
                }
            },
            Compression::None => (payload.to_vec(), false),
        };

        let mut headers = self.base_headers.clone();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        if compressed {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }
        if let Some(name) = &self.settings.header_tag {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(tag),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!("tag header '{name}' could not be set for this batch"),
            }
        }

        let mut request = self.client.post(&self.endpoint).headers(headers).body(body);
        if let Some(user) = &self.settings.http_user {
            request = request.basic_auth(user, self.settings.http_passwd.as_deref());
        }

        match request.send().await {
            Ok(response) => self.classify_response(response).await,
            Err(e) => {
                error!(
                    "could not flush records to {}:{} ({e})",
                    self.settings.host, self.settings.port
                );
                Outcome::Retry
            }
        }
    }

    async fn classify_response(&self, response: reqwest::Response) -> Outcome {
        let status = response.status().as_u16();
        let outcome = classify_status(status);
        let host = &self.settings.host;
        let port = self.settings.port;

        let body = if self.settings.log_response_payload {
            response.text().await.ok().filter(|b| !b.is_empty())
        } else {
            None
        };

        match (outcome, body) {
            (Outcome::Ok, Some(body)) => {
                info!("{host}:{port}, HTTP status={status}\n{body}");
            }
            (Outcome::Ok, None) => info!("{host}:{port}, HTTP status={status}"),
            (Outcome::Error, Some(body)) => {
                error!("{host}:{port}, unrecoverable HTTP status={status}\n{body}");
            }
            (Outcome::Error, None) => {
                error!("{host}:{port}, unrecoverable HTTP status={status}");
            }
            (Outcome::Retry, Some(body)) => {
                error!("{host}:{port}, HTTP status={status}\n{body}");
            }
            (Outcome::Retry, None) => error!("{host}:{port}, HTTP status={status}"),
        }
        outcome
    }
}

fn build_client(settings: &DeliverySettings) -> Result<reqwest::Client, Error> {
    match build_client_inner(settings, true) {
        Ok(client) => Ok(client),
        Err(e) => {
            error!("unable to apply proxy configuration: {e}, falling back to direct connection");
            build_client_inner(settings, false).map_err(Error::from)
        }
    }
}

fn build_client_inner(
    settings: &DeliverySettings,
    allow_proxy: bool,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().timeout(settings.flush_timeout());
    if allow_proxy {
        if let Some(proxy) = &settings.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
    }
    builder.build()
}

fn build_static_headers(settings: &DeliverySettings) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    for (key, value) in &settings.headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::Settings(format!("header name '{key}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Settings(format!("header value for '{key}': {e}")))?;
        if settings.allow_duplicate_headers {
            headers.append(name, value);
        } else {
            headers.insert(name, value);
        }
    }
    Ok(headers)
}

fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len()), GzipLevel::default());
    encoder.write_all(data)?;
    encoder.finish()
}
