//! Delivery settings resolved once at startup.
//!
//! The host process owns configuration parsing; this module only
//! defines the populated, read-only settings object the delivery
//! stage consumes, plus the enumerated option values. Everything
//! derives `Deserialize` so a host config layer can fill it in
//! directly.

use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Default name of the injected date field.
pub const DEFAULT_DATE_KEY: &str = "date";

const DEFAULT_FLUSH_TIMEOUT_SECS: u64 = 30;

/// Wire representation of a flushed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One JSON object per record, one HTTP request per record.
    #[default]
    Json,
    /// Same per-record delivery as `Json`; kept as a distinct option
    /// so hosts can carry their existing format names through.
    JsonStream,
    /// Same per-record delivery as `Json`.
    JsonLines,
    /// Newline-delimited GELF 1.1 objects, one request per batch.
    Gelf,
    /// Raw msgpack passthrough, one request per batch.
    Msgpack,
}

impl OutputFormat {
    /// MIME type sent as `Content-Type` for this format.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Msgpack => "application/x-msgpack",
            _ => "application/json",
        }
    }

    /// True for the formats that deliver one request per record.
    #[must_use]
    pub fn is_per_record(self) -> bool {
        matches!(
            self,
            OutputFormat::Json | OutputFormat::JsonStream | OutputFormat::JsonLines
        )
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "json_stream" => Ok(OutputFormat::JsonStream),
            "json_lines" => Ok(OutputFormat::JsonLines),
            "gelf" => Ok(OutputFormat::Gelf),
            "msgpack" => Ok(OutputFormat::Msgpack),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// Rendering of the injected date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// Seconds plus sub-second fraction as an IEEE-754 double.
    #[default]
    Double,
    /// UTC `YYYY-MM-DDTHH:MM:SS.ssssssZ`, microsecond precision.
    Iso8601,
    /// Integer seconds since the epoch.
    Epoch,
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "double" => Ok(DateFormat::Double),
            "iso8601" => Ok(DateFormat::Iso8601),
            "epoch" => Ok(DateFormat::Epoch),
            other => Err(format!("unknown date format '{other}'")),
        }
    }
}

/// Payload compression applied just before the POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            other => Err(format!("unknown compression '{other}'")),
        }
    }
}

/// Record-field names mapped onto the GELF core schema.
///
/// Any unset entry falls back to the conventional key of the same
/// name, so a record that already carries `short_message` needs no
/// mapping at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GelfFieldMapping {
    pub timestamp_key: Option<String>,
    pub host_key: Option<String>,
    pub short_message_key: Option<String>,
    pub full_message_key: Option<String>,
    pub level_key: Option<String>,
}

impl GelfFieldMapping {
    #[must_use]
    pub fn timestamp_key(&self) -> &str {
        self.timestamp_key.as_deref().unwrap_or("timestamp")
    }

    #[must_use]
    pub fn host_key(&self) -> &str {
        self.host_key.as_deref().unwrap_or("host")
    }

    #[must_use]
    pub fn short_message_key(&self) -> &str {
        self.short_message_key.as_deref().unwrap_or("short_message")
    }

    #[must_use]
    pub fn full_message_key(&self) -> &str {
        self.full_message_key.as_deref().unwrap_or("full_message")
    }

    #[must_use]
    pub fn level_key(&self) -> &str {
        self.level_key.as_deref().unwrap_or("level")
    }
}

/// Immutable configuration for one delivery target.
///
/// Owned by the [`crate::flusher::Flusher`] for the lifetime of the
/// output instance and read-only during a flush.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeliverySettings {
    /// Collector host.
    pub host: String,
    /// Collector port.
    pub port: u16,
    /// Request path, normalized to a leading `/`.
    pub uri: String,
    /// Use `https` instead of `http` for the endpoint scheme.
    pub tls: bool,
    /// Optional proxy URL, e.g. `http://proxy:3128`.
    pub proxy: Option<String>,
    /// Basic-auth user; auth is sent only when this is set.
    pub http_user: Option<String>,
    /// Basic-auth password.
    pub http_passwd: Option<String>,
    /// Name of a header whose value is the batch tag.
    pub header_tag: Option<String>,
    /// Static headers appended to every request.
    pub headers: Vec<(String, String)>,
    /// Append duplicate static headers instead of replacing them.
    pub allow_duplicate_headers: bool,
    /// Log collector response bodies alongside the status line.
    pub log_response_payload: bool,
    pub format: OutputFormat,
    pub json_date_format: DateFormat,
    /// Injected date field name; `None` disables injection.
    pub json_date_key: Option<String>,
    pub compress: Compression,
    pub gelf: GelfFieldMapping,
    /// Per-request timeout enforced by the HTTP client, in seconds.
    pub flush_timeout_secs: u64,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        DeliverySettings {
            host: "127.0.0.1".to_string(),
            port: 80,
            uri: "/".to_string(),
            tls: false,
            proxy: None,
            http_user: None,
            http_passwd: None,
            header_tag: None,
            headers: Vec::new(),
            allow_duplicate_headers: true,
            log_response_payload: true,
            format: OutputFormat::default(),
            json_date_format: DateFormat::default(),
            json_date_key: Some(DEFAULT_DATE_KEY.to_string()),
            compress: Compression::default(),
            gelf: GelfFieldMapping::default(),
            flush_timeout_secs: DEFAULT_FLUSH_TIMEOUT_SECS,
        }
    }
}

impl DeliverySettings {
    /// Full endpoint URL the client posts to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        let uri = if self.uri.starts_with('/') {
            self.uri.clone()
        } else {
            format!("/{}", self.uri)
        };
        format!("{scheme}://{}:{}{uri}", self.host, self.port)
    }

    #[must_use]
    pub fn flush_timeout(&self) -> Duration {
        Duration::from_secs(self.flush_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_str() {
        assert_eq!("json".parse(), Ok(OutputFormat::Json));
        assert_eq!("json_stream".parse(), Ok(OutputFormat::JsonStream));
        assert_eq!("json_lines".parse(), Ok(OutputFormat::JsonLines));
        assert_eq!("GELF".parse(), Ok(OutputFormat::Gelf));
        assert_eq!("msgpack".parse(), Ok(OutputFormat::Msgpack));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn date_format_from_str() {
        assert_eq!("double".parse(), Ok(DateFormat::Double));
        assert_eq!("iso8601".parse(), Ok(DateFormat::Iso8601));
        assert_eq!("epoch".parse(), Ok(DateFormat::Epoch));
        assert!("rfc2822".parse::<DateFormat>().is_err());
    }

    #[test]
    fn content_types() {
        assert_eq!(OutputFormat::Json.content_type(), "application/json");
        assert_eq!(OutputFormat::Gelf.content_type(), "application/json");
        assert_eq!(
            OutputFormat::Msgpack.content_type(),
            "application/x-msgpack"
        );
    }

    #[test]
    fn per_record_formats() {
        assert!(OutputFormat::Json.is_per_record());
        assert!(OutputFormat::JsonStream.is_per_record());
        assert!(OutputFormat::JsonLines.is_per_record());
        assert!(!OutputFormat::Gelf.is_per_record());
        assert!(!OutputFormat::Msgpack.is_per_record());
    }

    #[test]
    fn endpoint_building() {
        let mut settings = DeliverySettings {
            host: "collector.example.com".to_string(),
            port: 8080,
            uri: "logs/ingest".to_string(),
            ..DeliverySettings::default()
        };
        assert_eq!(
            settings.endpoint(),
            "http://collector.example.com:8080/logs/ingest"
        );

        settings.tls = true;
        settings.uri = "/v1".to_string();
        assert_eq!(settings.endpoint(), "https://collector.example.com:8080/v1");
    }

    #[test]
    fn gelf_mapping_defaults() {
        let mapping = GelfFieldMapping::default();
        assert_eq!(mapping.timestamp_key(), "timestamp");
        assert_eq!(mapping.host_key(), "host");
        assert_eq!(mapping.short_message_key(), "short_message");
        assert_eq!(mapping.full_message_key(), "full_message");
        assert_eq!(mapping.level_key(), "level");

        let mapping = GelfFieldMapping {
            short_message_key: Some("msg".to_string()),
            ..GelfFieldMapping::default()
        };
        assert_eq!(mapping.short_message_key(), "msg");
    }

    #[test]
    fn default_date_key() {
        let settings = DeliverySettings::default();
        assert_eq!(settings.json_date_key.as_deref(), Some("date"));
        assert_eq!(settings.json_date_format, DateFormat::Double);
    }

    #[test]
    fn settings_from_json_config() {
        let settings: DeliverySettings = serde_json::from_str(
            r#"{
                "host": "graylog.internal",
                "port": 12201,
                "uri": "/gelf",
                "format": "gelf",
                "compress": "gzip",
                "gelf": {"short_message_key": "log"}
            }"#,
        )
        .unwrap();
        assert_eq!(settings.host, "graylog.internal");
        assert_eq!(settings.format, OutputFormat::Gelf);
        assert_eq!(settings.compress, Compression::Gzip);
        assert_eq!(settings.gelf.short_message_key(), "log");
    }
}
