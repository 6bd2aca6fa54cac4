use crate::ProcessingConfig;
use crate::scale::{ImageProcessor, OutputFormat, ProcessError, RasterProcessor, resolve};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    }));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

#[test]
fn test_resize_and_convert_to_jpeg() {
    let options = resolve(Some("20"), None, None, &ProcessingConfig::default());
    let output = RasterProcessor::new().process(&png_bytes(100, 50), &options).unwrap();

    assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Jpeg);
    let decoded = image::load_from_memory(&output).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (20, 10));
}

#[test]
fn test_embed_into_box_as_png() {
    let options = resolve(Some("64"), Some("64"), Some("png"), &ProcessingConfig::default());
    let output = RasterProcessor::new().process(&png_bytes(100, 50), &options).unwrap();

    assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Png);
    let decoded = image::load_from_memory(&output).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 64));
}

#[test]
fn test_undecodable_input_is_decode_error() {
    let options = resolve(None, None, None, &ProcessingConfig::default());
    let result = RasterProcessor::new().process(b"definitely not an image", &options);
    assert!(matches!(result, Err(ProcessError::Decode(_))));
}

#[cfg(not(feature = "heif"))]
#[test]
fn test_heif_output_is_unsupported() {
    let options = resolve(None, None, Some("heic"), &ProcessingConfig::default());
    assert_eq!(options.format, OutputFormat::Heif);
    let result = RasterProcessor::new().process(&png_bytes(8, 8), &options);
    assert!(matches!(result, Err(ProcessError::UnsupportedFormat(_))));
}

#[cfg(feature = "heif")]
#[test]
fn test_heif_output() {
    let options = resolve(Some("16"), None, Some("heic"), &ProcessingConfig::default());
    let output = RasterProcessor::new().process(&png_bytes(32, 16), &options).unwrap();
    assert_eq!(&output[4..8], b"ftyp");
}

#[test]
fn test_huge_width_is_refused_before_allocating() {
    let options = resolve(Some("100000"), None, Some("png"), &ProcessingConfig::default());
    let result = RasterProcessor::new().process(&png_bytes(2, 2), &options);
    assert!(matches!(result, Err(ProcessError::TooManyPixels { .. })));
}

#[test]
fn test_configured_output_limit() {
    let config = ProcessingConfig {
        max_output_pixels: 100,
        ..ProcessingConfig::default()
    };
    let processor = RasterProcessor::from_config(&config);

    let small = resolve(Some("10"), None, Some("png"), &config);
    assert!(processor.process(&png_bytes(20, 20), &small).is_ok());

    let large = resolve(Some("11"), None, Some("png"), &config);
    assert!(matches!(
        processor.process(&png_bytes(20, 20), &large),
        Err(ProcessError::TooManyPixels { .. })
    ));
}

#[test]
fn test_oversized_upload_is_refused_at_decode() {
    let config = ProcessingConfig {
        max_input_dimension: 16,
        ..ProcessingConfig::default()
    };
    let processor = RasterProcessor::from_config(&config);
    let options = resolve(None, None, Some("png"), &config);

    assert!(processor.process(&png_bytes(16, 16), &options).is_ok());
    assert!(matches!(
        processor.process(&png_bytes(17, 4), &options),
        Err(ProcessError::Decode(_))
    ));
}

#[test]
fn test_processing_is_deterministic() {
    let input = png_bytes(48, 48);
    let options = resolve(Some("16"), Some("16"), Some("webp"), &ProcessingConfig::default());
    let processor = RasterProcessor::new();

    let first = processor.process(&input, &options).unwrap();
    let second = processor.process(&input, &options).unwrap();
    assert_eq!(first, second);
}
