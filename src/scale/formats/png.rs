use image::{
    DynamicImage,
    codecs::png::{CompressionType, FilterType, PngEncoder},
};

use crate::scale::ProcessError;

/// Map a zlib-style 0-9 level onto the encoder presets.
pub fn compression_type(level: u8) -> CompressionType {
    match level {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

pub fn encode(image: &DynamicImage, compression: u8) -> Result<Vec<u8>, ProcessError> {
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut buffer,
        compression_type(compression),
        FilterType::Adaptive,
    );
    image.write_with_encoder(encoder)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_levels() {
        assert!(matches!(compression_type(0), CompressionType::Fast));
        assert!(matches!(compression_type(5), CompressionType::Default));
        assert!(matches!(compression_type(9), CompressionType::Best));
        assert!(matches!(compression_type(200), CompressionType::Best));
    }
}
