use image::DynamicImage;
use tracing::debug;

/// EXIF Orientation tag values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    pub fn from_tag(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Normal),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Transpose),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Transverse),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::FlipHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::FlipVertical => img.flipv(),
            Self::Transpose => img.rotate90().fliph(),
            Self::Rotate90 => img.rotate90(),
            Self::Transverse => img.rotate270().fliph(),
            Self::Rotate270 => img.rotate270(),
        }
    }
}

/// Read the Orientation tag from JPEG/TIFF bytes, if any.
pub fn read_orientation(data: &[u8]) -> Option<Orientation> {
    let exif = rexif::parse_buffer(data).ok()?;

    exif.entries
        .iter()
        .find(|entry| matches!(entry.tag, rexif::ExifTag::Orientation))
        .and_then(|entry| match &entry.value {
            rexif::TagValue::U16(values) => values.first().copied(),
            _ => None,
        })
        .and_then(Orientation::from_tag)
}

/// Rotate/flip the decoded image so it displays upright.
pub fn auto_orient(img: DynamicImage, data: &[u8]) -> DynamicImage {
    match read_orientation(data) {
        Some(orientation) if orientation != Orientation::Normal => {
            debug!("Applying EXIF orientation {:?}", orientation);
            orientation.apply(img)
        }
        _ => img,
    }
}
