//! The image processing capability behind the scale endpoint.
//!
//! [`ImageProcessor`] is the only seam between request handling and the
//! codecs: bytes and resolved options in, encoded bytes out. The handler
//! never inspects pixels, so any backend (or a test double) can sit here.
//!
//! [`RasterProcessor`] is the production implementation, built on the
//! `image` crate:
//!
//! | Step | Implementation |
//! |---|---|
//! | Decode | `image::ImageReader` with format sniffing, bounded by `image::Limits` |
//! | Orientation | EXIF Orientation tag via `rexif` |
//! | Resize | `resize_exact` with `Lanczos3`, embed/crop in [`resize`](super::resize) |
//! | Encode | per-format encoders in [`formats`](super::formats) |
//!
//! Both ends are bounded: uploads wider or taller than `max_input_dimension`
//! fail to decode, and no resize target or canvas may exceed
//! `max_output_pixels`.

use image::{ImageReader, Limits};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

use crate::{DEFAULT_MAX_INPUT_DIMENSION, DEFAULT_MAX_OUTPUT_PIXELS, ProcessingConfig};

use super::error::ProcessError;
use super::types::ProcessingOptions;
use super::{formats, orientation, resize};

pub trait ImageProcessor: Send + Sync {
    /// Decode `input`, apply `options` and return the encoded result.
    fn process(&self, input: &[u8], options: &ProcessingOptions) -> Result<Vec<u8>, ProcessError>;
}

pub type SharedProcessor = Arc<dyn ImageProcessor>;

/// Processor using the `image` crate ecosystem.
#[derive(Debug, Clone, Copy)]
pub struct RasterProcessor {
    max_input_dimension: u32,
    max_output_pixels: u64,
}

impl RasterProcessor {
    pub fn new() -> Self {
        Self {
            max_input_dimension: DEFAULT_MAX_INPUT_DIMENSION,
            max_output_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }

    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self {
            max_input_dimension: config.max_input_dimension,
            max_output_pixels: config.max_output_pixels,
        }
    }

    fn decode_limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_input_dimension);
        limits.max_image_height = Some(self.max_input_dimension);
        limits
    }
}

impl Default for RasterProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProcessor for RasterProcessor {
    fn process(&self, input: &[u8], options: &ProcessingOptions) -> Result<Vec<u8>, ProcessError> {
        // Fail before decoding when the target can never be written.
        if cfg!(not(feature = "heif")) && options.format == formats::OutputFormat::Heif {
            return Err(ProcessError::UnsupportedFormat("heif"));
        }

        let mut reader = ImageReader::new(Cursor::new(input))
            .with_guessed_format()
            .map_err(|e| ProcessError::Decode(e.to_string()))?;
        reader.limits(self.decode_limits());
        debug!("Decoding upload, detected format: {:?}", reader.format());

        let img = reader
            .decode()
            .map_err(|e| ProcessError::Decode(e.to_string()))?;
        let img = orientation::auto_orient(img, input);
        let img = resize::apply(img, options, self.max_output_pixels)?;

        let output = formats::encode(&img, options)?;
        debug!(
            "Encoded {}x{} .{}: {} bytes",
            img.width(),
            img.height(),
            options.format.extension(),
            output.len()
        );
        Ok(output)
    }
}
