use image::DynamicImage;

use crate::scale::ProcessError;

/// Lossy WebP at the given quality (0-100).
pub fn encode(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ProcessError> {
    let quality = quality.min(100) as f32;

    let encoded = if image.color().has_alpha() {
        let rgba_image = image.to_rgba8();
        let (width, height) = rgba_image.dimensions();
        webp::Encoder::from_rgba(&rgba_image, width, height).encode(quality)
    } else {
        let rgb_image = image.to_rgb8();
        let (width, height) = rgb_image.dimensions();
        webp::Encoder::from_rgb(&rgb_image, width, height).encode(quality)
    };

    if encoded.is_empty() {
        return Err(ProcessError::Encode("WebP encoder produced no data".to_string()));
    }
    Ok(encoded.to_vec())
}
