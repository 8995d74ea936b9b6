//! Error taxonomy for the delivery stage.

use thiserror::Error as ThisError;

/// Failures raised while decoding, encoding or delivering a batch.
///
/// None of these escape [`crate::flusher::Flusher::flush`]; the
/// orchestrator converts each into an [`crate::outcome::Outcome`]
/// before returning.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The batch framing itself is truncated or corrupt. Individual
    /// malformed units inside a well-framed batch are skipped, not
    /// reported here.
    #[error("malformed batch framing: {0}")]
    Decode(#[from] rmpv::decode::Error),

    /// A record could not be rendered as a JSON object.
    #[error("cannot encode record as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A record could not be mapped onto the GELF schema.
    #[error("cannot encode record as GELF: {0}")]
    Gelf(String),

    /// The delivery settings are unusable (bad endpoint, bad header
    /// name, unparsable proxy).
    #[error("invalid delivery settings: {0}")]
    Settings(String),

    /// The HTTP client could not be constructed.
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
}
