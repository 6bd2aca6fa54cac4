use crate::ProcessingConfig;

use super::types::{OutputFormat, ProcessingOptions};

/// Map the requested format name onto an output format.
///
/// Matching is case-insensitive. Anything unrecognised, including an empty
/// or missing value, falls back to JPEG rather than failing the request.
pub fn parse_format(format: Option<&str>) -> OutputFormat {
    match format.unwrap_or_default().to_lowercase().as_str() {
        "png" => OutputFormat::Png,
        "webp" => OutputFormat::WebP,
        "gif" => OutputFormat::Gif,
        "heif" | "heic" => OutputFormat::Heif,
        "avif" => OutputFormat::Avif,
        _ => OutputFormat::Jpeg,
    }
}

/// Parse a dimension, treating anything that is not a non-negative integer as 0 (auto).
pub fn parse_dimension(value: Option<&str>) -> u32 {
    value.and_then(|v| v.parse::<u32>().ok()).unwrap_or(0)
}

/// Resolve query parameters into the options handed to the processor.
pub fn resolve(
    width: Option<&str>,
    height: Option<&str>,
    format: Option<&str>,
    config: &ProcessingConfig,
) -> ProcessingOptions {
    ProcessingOptions {
        width: parse_dimension(width),
        height: parse_dimension(height),
        format: parse_format(format),
        quality: config.quality,
        compression: config.compression,
        extend: config.extend,
        background: config.background,
        embed: config.embed,
        enlarge: config.enlarge,
        strip_metadata: config.strip_metadata,
        strip_profile: config.strip_profile,
    }
}
