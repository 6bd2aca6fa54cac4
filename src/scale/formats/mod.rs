pub mod avif;
pub mod gif;
pub mod heif;
pub mod jpeg;
pub mod png;
pub mod webp;

pub use super::types::OutputFormat;

use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

use super::error::ProcessError;
use super::types::ProcessingOptions;

/// Encode the final image in the requested format.
///
/// None of the encoders write EXIF or ICC data, so output is always
/// stripped of metadata and colour profiles.
pub fn encode(image: &DynamicImage, options: &ProcessingOptions) -> Result<Vec<u8>, ProcessError> {
    if !options.strip_metadata || !options.strip_profile {
        debug!("Metadata passthrough requested but encoders never embed metadata");
    }

    match options.format {
        OutputFormat::Jpeg => jpeg::encode(image, options.quality, options.fill_color()),
        OutputFormat::Png => png::encode(image, options.compression),
        OutputFormat::WebP => webp::encode(image, options.quality),
        OutputFormat::Gif => gif::encode(image),
        OutputFormat::Avif => avif::encode(image, options.quality),
        OutputFormat::Heif => heif::encode(image, options.quality, options.fill_color()),
    }
}

/// Composite an image with alpha over a solid colour.
pub fn flatten(image: &DynamicImage, fill: [u8; 3]) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8, f: u8| ((c as u32 * alpha + f as u32 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r, fill[0]), blend(g, fill[1]), blend(b, fill[2])])
    })
}
