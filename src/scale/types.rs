use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    WebP,
    Gif,
    Heif,
    Avif,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Gif => "gif",
            OutputFormat::Heif => "heic",
            OutputFormat::Avif => "avif",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Heif => "image/heif",
            OutputFormat::Avif => "image/avif",
        }
    }
}

/// How the canvas is filled when embedding leaves uncovered area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Extend {
    Black,
    White,
    /// Fill with the configured background colour.
    #[default]
    Background,
}

impl Extend {
    pub fn fill(&self, background: [u8; 3]) -> [u8; 3] {
        match self {
            Extend::Black => [0, 0, 0],
            Extend::White => [0xFF, 0xFF, 0xFF],
            Extend::Background => background,
        }
    }
}

/// Fully resolved parameters for one processing call.
///
/// A width or height of 0 means "derive from the source".
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOptions {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: u8,
    pub compression: u8,
    pub extend: Extend,
    pub background: [u8; 3],
    pub embed: bool,
    pub enlarge: bool,
    pub strip_metadata: bool,
    pub strip_profile: bool,
}

impl ProcessingOptions {
    /// Colour used for padding and for flattening alpha.
    pub fn fill_color(&self) -> [u8; 3] {
        self.extend.fill(self.background)
    }
}

/// Raw query values for a scale request, before any parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleQuery {
    pub width: Option<String>,
    pub height: Option<String>,
    pub format: Option<String>,
}

impl ScaleQuery {
    /// Pick out the known keys; the first occurrence of each wins and
    /// anything else is ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "width" => &mut query.width,
                "height" => &mut query.height,
                "format" => &mut query.format,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}
