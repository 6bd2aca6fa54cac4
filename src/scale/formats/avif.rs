use image::DynamicImage;

use crate::scale::ProcessError;

/// Encoder speed: 1 is slowest/best, 10 fastest.
#[cfg(feature = "avif")]
const AVIF_SPEED: u8 = 6;

#[cfg(feature = "avif")]
pub fn encode(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ProcessError> {
    use image::{ImageEncoder, codecs::avif::AvifEncoder};

    let rgba_image = image.to_rgba8();
    let mut buffer = Vec::new();
    let encoder = AvifEncoder::new_with_speed_quality(&mut buffer, AVIF_SPEED, quality.clamp(1, 100));
    encoder.write_image(
        &rgba_image,
        rgba_image.width(),
        rgba_image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}

#[cfg(not(feature = "avif"))]
pub fn encode(_image: &DynamicImage, _quality: u8) -> Result<Vec<u8>, ProcessError> {
    Err(ProcessError::UnsupportedFormat("avif"))
}
