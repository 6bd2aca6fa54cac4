// Scale module - upload validation, option resolution and image processing
mod error;
pub mod formats;
mod handlers;
mod options;
mod orientation;
mod processor;
mod resize;
mod types;

// Re-export public items
pub use error::{EMPTY_IMAGE_MESSAGE, MISSING_IMAGE_MESSAGE, ProcessError, ScaleError};
pub use handlers::{IMAGE_FIELD, scale_handler};
pub use options::{parse_dimension, parse_format, resolve};
pub use processor::{ImageProcessor, RasterProcessor, SharedProcessor};
pub use resize::ImageSize;
pub use types::{Extend, OutputFormat, ProcessingOptions, ScaleQuery};

#[cfg(test)]
mod tests {
    mod encode_tests;
    mod processor_tests;
    mod resize_tests;
}
