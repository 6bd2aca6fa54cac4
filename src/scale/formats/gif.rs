use image::{DynamicImage, Frame, codecs::gif::GifEncoder};

use crate::scale::ProcessError;

/// Single-frame GIF; the encoder quantizes to a 256 colour palette.
pub fn encode(image: &DynamicImage) -> Result<Vec<u8>, ProcessError> {
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buffer);
        encoder.encode_frame(Frame::new(image.to_rgba8()))?;
    }
    Ok(buffer)
}
