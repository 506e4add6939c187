//! Configuration module

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Expected value of the `api-key` header. `None` (unset or blank) rejects every request.
    pub api_key: Option<String>,

    /// Classifier artifact (`.json` tree ensemble or `.onnx`)
    pub model_path: PathBuf,

    /// Fitted product_type vocabulary
    pub product_encoder_path: PathBuf,

    /// Fitted packaging_type vocabulary
    pub packaging_encoder_path: PathBuf,

    /// Optional SHA-256 pins for the three artifacts (hex)
    pub model_sha256: Option<String>,
    pub product_encoder_sha256: Option<String>,
    pub packaging_encoder_sha256: Option<String>,

    /// Processing errors keep HTTP 200 (legacy wire behavior) when true,
    /// otherwise they are sent as 422 with the same body.
    pub legacy_error_status: bool,

    /// `json` for structured log lines, anything else for human-readable output
    pub log_format: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            api_key: None,
            model_path: PathBuf::from("spoilage_model.json"),
            product_encoder_path: PathBuf::from("product_encoder.json"),
            packaging_encoder_path: PathBuf::from("packaging_encoder.json"),
            model_sha256: None,
            product_encoder_sha256: None,
            packaging_encoder_sha256: None,
            legacy_error_status: true,
            log_format: "pretty".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: lookup("HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.host),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            api_key: non_empty("API_KEY"),

            model_path: non_empty("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            product_encoder_path: non_empty("PRODUCT_ENCODER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.product_encoder_path),

            packaging_encoder_path: non_empty("PACKAGING_ENCODER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.packaging_encoder_path),

            model_sha256: non_empty("MODEL_SHA256"),
            product_encoder_sha256: non_empty("PRODUCT_ENCODER_SHA256"),
            packaging_encoder_sha256: non_empty("PACKAGING_ENCODER_SHA256"),

            legacy_error_status: lookup("LEGACY_ERROR_STATUS")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.legacy_error_status),

            log_format: non_empty("LOG_FORMAT").unwrap_or(defaults.log_format),

            environment: non_empty("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if structured JSON logging was requested
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
