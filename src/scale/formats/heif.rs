use image::DynamicImage;

use crate::scale::ProcessError;

#[cfg(feature = "heif")]
pub fn encode(image: &DynamicImage, quality: u8, fill: [u8; 3]) -> Result<Vec<u8>, ProcessError> {
    use libheif_rs::{
        Channel, ColorSpace, CompressionFormat, EncoderQuality, HeifContext, HeifError, Image,
        LibHeif, RgbChroma,
    };

    let encode_error = |e: HeifError| ProcessError::Encode(e.to_string());

    // HEVC output here is opaque, so alpha is composited like JPEG.
    let rgb = super::flatten(image, fill);
    let (width, height) = rgb.dimensions();

    let mut heif_image =
        Image::new(width, height, ColorSpace::Rgb(RgbChroma::Rgb)).map_err(encode_error)?;
    heif_image
        .create_plane(Channel::Interleaved, width, height, 8)
        .map_err(encode_error)?;

    let planes = heif_image.planes_mut();
    let plane = planes
        .interleaved
        .ok_or_else(|| ProcessError::Encode("HEIF image has no interleaved plane".to_string()))?;
    let row_len = width as usize * 3;
    for (y, row) in rgb.as_raw().chunks_exact(row_len).enumerate() {
        let start = y * plane.stride;
        plane.data[start..start + row_len].copy_from_slice(row);
    }

    let lib_heif = LibHeif::new();
    let mut context = HeifContext::new().map_err(encode_error)?;
    let mut encoder = lib_heif
        .encoder_for_format(CompressionFormat::Hevc)
        .map_err(encode_error)?;
    encoder
        .set_quality(EncoderQuality::Lossy(quality.clamp(1, 100)))
        .map_err(encode_error)?;
    context
        .encode_image(&heif_image, &mut encoder, None)
        .map_err(encode_error)?;

    context.write_to_bytes().map_err(encode_error)
}

#[cfg(not(feature = "heif"))]
pub fn encode(_image: &DynamicImage, _quality: u8, _fill: [u8; 3]) -> Result<Vec<u8>, ProcessError> {
    Err(ProcessError::UnsupportedFormat("heif"))
}
