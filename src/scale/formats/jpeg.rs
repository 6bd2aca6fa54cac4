use image::{DynamicImage, ImageEncoder, codecs::jpeg::JpegEncoder};
use tracing::debug;

use super::flatten;
use crate::scale::ProcessError;

/// Encode as JPEG; transparency is flattened onto `fill`.
pub fn encode(image: &DynamicImage, quality: u8, fill: [u8; 3]) -> Result<Vec<u8>, ProcessError> {
    let rgb_image = flatten(image, fill);
    let quality = quality.clamp(1, 100);

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.write_image(
        &rgb_image,
        rgb_image.width(),
        rgb_image.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    debug!("JPEG encoded at quality {}: {} bytes", quality, buffer.len());
    Ok(buffer)
}
