use image::{DynamicImage, Rgba, RgbaImage, imageops::FilterType};
use tracing::debug;

use super::error::ProcessError;
use super::types::ProcessingOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            width: ((self.width as f64 * factor).round() as u32).max(1),
            height: ((self.height as f64 * factor).round() as u32).max(1),
        }
    }
}

fn limit_factor(factor: f64, enlarge: bool) -> f64 {
    if enlarge { factor } else { factor.min(1.0) }
}

/// Largest size with the source aspect ratio that fits inside `bounds`.
pub fn fitted_size(source: ImageSize, bounds: ImageSize, enlarge: bool) -> ImageSize {
    let factor = (bounds.width as f64 / source.width as f64)
        .min(bounds.height as f64 / source.height as f64);
    let size = source.scaled(limit_factor(factor, enlarge));
    ImageSize::new(size.width.min(bounds.width), size.height.min(bounds.height))
}

/// Smallest size with the source aspect ratio that covers `bounds`.
pub fn covering_size(source: ImageSize, bounds: ImageSize, enlarge: bool) -> ImageSize {
    let factor = (bounds.width as f64 / source.width as f64)
        .max(bounds.height as f64 / source.height as f64);
    source.scaled(limit_factor(factor, enlarge))
}

/// Size when only one axis is requested; the other follows the aspect ratio.
pub fn single_axis_size(source: ImageSize, width: u32, height: u32, enlarge: bool) -> ImageSize {
    let factor = if width > 0 {
        width as f64 / source.width as f64
    } else {
        height as f64 / source.height as f64
    };
    source.scaled(limit_factor(factor, enlarge))
}

/// Refuse any buffer larger than `max_pixels` before it is allocated.
fn check_pixels(size: ImageSize, max_pixels: u64) -> Result<(), ProcessError> {
    if size.pixels() > max_pixels {
        return Err(ProcessError::TooManyPixels {
            width: size.width,
            height: size.height,
            max_pixels,
        });
    }
    Ok(())
}

fn resize_to(img: DynamicImage, size: ImageSize) -> DynamicImage {
    if img.width() == size.width && img.height() == size.height {
        img
    } else {
        img.resize_exact(size.width, size.height, FilterType::Lanczos3)
    }
}

/// Centre `img` on a canvas of `size` filled with `fill`.
fn embed_on_canvas(img: &DynamicImage, size: ImageSize, fill: [u8; 3]) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(
        size.width,
        size.height,
        Rgba([fill[0], fill[1], fill[2], 0xFF]),
    );
    let x = (size.width.saturating_sub(img.width()) / 2) as i64;
    let y = (size.height.saturating_sub(img.height()) / 2) as i64;
    image::imageops::overlay(&mut canvas, &img.to_rgba8(), x, y);
    DynamicImage::ImageRgba8(canvas)
}

/// Apply the requested geometry to a decoded image.
///
/// Every size that would be allocated (resize target, embed canvas) is
/// checked against `max_pixels` first.
pub fn apply(
    img: DynamicImage,
    options: &ProcessingOptions,
    max_pixels: u64,
) -> Result<DynamicImage, ProcessError> {
    let source = ImageSize::new(img.width(), img.height());
    if source.width == 0 || source.height == 0 {
        return Ok(img);
    }

    match (options.width, options.height) {
        (0, 0) => Ok(img),
        (width, height) if width == 0 || height == 0 => {
            let size = single_axis_size(source, width, height, options.enlarge);
            check_pixels(size, max_pixels)?;
            debug!("Resizing {:?} -> {:?}", source, size);
            Ok(resize_to(img, size))
        }
        (width, height) => {
            let bounds = ImageSize::new(width, height);
            if options.embed {
                check_pixels(bounds, max_pixels)?;
                let size = fitted_size(source, bounds, options.enlarge);
                debug!("Embedding {:?} -> {:?} in {:?}", source, size, bounds);
                let resized = resize_to(img, size);
                if size == bounds {
                    Ok(resized)
                } else {
                    Ok(embed_on_canvas(&resized, bounds, options.fill_color()))
                }
            } else {
                let size = covering_size(source, bounds, options.enlarge);
                check_pixels(size, max_pixels)?;
                debug!("Cropping {:?} -> {:?} to {:?}", source, size, bounds);
                let resized = resize_to(img, size);
                let crop_width = bounds.width.min(resized.width());
                let crop_height = bounds.height.min(resized.height());
                let x = (resized.width() - crop_width) / 2;
                let y = (resized.height() - crop_height) / 2;
                Ok(resized.crop_imm(x, y, crop_width, crop_height))
            }
        }
    }
}
