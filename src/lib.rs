use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub mod diagnostics;
pub mod scale;
pub mod startup_checks;
pub mod welcome;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Limits applied to the multipart upload before anything is decoded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest non-file form field held in memory, in bytes.
    pub max_memory: u64,
    /// Largest accepted `image` field, in bytes.
    pub max_file_size: u64,
}

/// Fixed processing parameters applied to every request.
///
/// Only width, height and output format come from the client; everything
/// here is operator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub quality: u8,
    pub compression: u8,
    pub background: [u8; 3],
    pub extend: scale::Extend,
    pub embed: bool,
    pub enlarge: bool,
    pub strip_metadata: bool,
    pub strip_profile: bool,
    pub processing_timeout_secs: Option<u64>,
    /// Largest width or height accepted from a decoded upload.
    pub max_input_dimension: u32,
    /// Largest pixel count any resize target or canvas may have.
    pub max_output_pixels: u64,
}

pub const DEFAULT_MAX_MEMORY: u64 = 64 * 1024;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 512 * 1024 * 1024;
pub const DEFAULT_MAX_INPUT_DIMENSION: u32 = 16_384;
pub const DEFAULT_MAX_OUTPUT_PIXELS: u64 = 40_000_000;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_memory: DEFAULT_MAX_MEMORY,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            quality: 99,
            compression: 9,
            background: [0xFF, 0xFF, 0xFF],
            extend: scale::Extend::Background,
            embed: true,
            enlarge: true,
            strip_metadata: true,
            strip_profile: true,
            processing_timeout_secs: None,
            max_input_dimension: DEFAULT_MAX_INPUT_DIMENSION,
            max_output_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml_edit::de::Error),
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Ok(toml_edit::de::from_str::<Config>(&content)?)
    }
}

impl UploadConfig {
    /// Cap for the whole request body: the image plus room for the other fields.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_file_size.saturating_add(self.max_memory)).unwrap_or(usize::MAX)
    }
}

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub processor: scale::SharedProcessor,
    pub config: Config,
}

pub async fn create_app(config: Config) -> Router {
    let processor = scale::RasterProcessor::from_config(&config.processing);
    create_app_with_processor(config, Arc::new(processor))
}

/// Build the router around a specific image processor.
///
/// Tests use this to swap in a processor that never touches a codec.
pub fn create_app_with_processor(config: Config, processor: scale::SharedProcessor) -> Router {
    let body_limit = config.upload.body_limit();

    let app_state = AppState {
        processor,
        config: config.clone(),
    };

    Router::new()
        .route("/", axum::routing::get(welcome::welcome_handler))
        .route(
            "/scale",
            axum::routing::post(scale::scale_handler).layer(DefaultBodyLimit::max(body_limit)),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let method = request.method();
                    let uri = request.uri();
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");
                    let content_length = headers
                        .get("content-length")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %method,
                        path = %uri.path(),
                        query = ?uri.query(),
                        user_agent = %user_agent,
                        content_length = %content_length,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();
                        let size = response
                            .headers()
                            .get("content-length")
                            .and_then(|h| h.to_str().ok())
                            .unwrap_or("-");

                        tracing::info!(
                            target: "access_log",
                            status = %status,
                            size = %size,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_match_service_constants() {
        let config = Config::default();
        assert_eq!(config.upload.max_memory, 64 * 1024);
        assert_eq!(config.upload.max_file_size, 512 * 1024 * 1024);
        assert_eq!(config.processing.quality, 99);
        assert_eq!(config.processing.compression, 9);
        assert_eq!(config.processing.background, [255, 255, 255]);
        assert!(config.processing.embed);
        assert!(config.processing.enlarge);
        assert!(config.processing.strip_metadata);
        assert!(config.processing.strip_profile);
        assert!(config.processing.processing_timeout_secs.is_none());
        assert_eq!(config.processing.max_input_dimension, 16_384);
        assert_eq!(config.processing.max_output_pixels, 40_000_000);
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let toml = r#"
[server]
port = 8080

[upload]
max_file_size = 1048576

[processing]
quality = 80
extend = "black"
"#;
        let config: Config = toml_edit::de::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.upload.max_file_size, 1_048_576);
        assert_eq!(config.upload.max_memory, DEFAULT_MAX_MEMORY);
        assert_eq!(config.processing.quality, 80);
        assert_eq!(config.processing.compression, 9);
        assert_eq!(config.processing.extend, scale::Extend::Black);
    }

    #[test]
    fn test_empty_config_file_is_default() {
        let config: Config = toml_edit::de::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.upload.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.upload.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[upload]\nmax_memory = 1024\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.upload.max_memory, 1024);
        assert_eq!(config.processing.quality, 99);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[upload\nmax_memory = ").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_body_limit_covers_file_and_fields() {
        let upload = UploadConfig {
            max_memory: 10,
            max_file_size: 100,
        };
        assert_eq!(upload.body_limit(), 110);

        let huge = UploadConfig {
            max_memory: u64::MAX,
            max_file_size: u64::MAX,
        };
        assert_eq!(huge.body_limit() as u64, u64::MAX.min(usize::MAX as u64));
    }
}
