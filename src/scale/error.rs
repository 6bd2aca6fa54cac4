use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

pub const MISSING_IMAGE_MESSAGE: &str = "File 'image' could not be processed.";
pub const EMPTY_IMAGE_MESSAGE: &str = "File 'image' is empty.";

/// Failures reported by an image processor.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Target of {width}x{height} exceeds the {max_pixels} pixel limit")]
    TooManyPixels {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(&'static str),

    #[error("Processing task failed: {0}")]
    Task(String),
}

impl From<image::ImageError> for ProcessError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Decoding(_) => ProcessError::Decode(err.to_string()),
            _ => ProcessError::Encode(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("{0}")]
    Multipart(String),

    #[error("{}", MISSING_IMAGE_MESSAGE)]
    MissingImage,

    #[error("{}", EMPTY_IMAGE_MESSAGE)]
    EmptyImage,

    #[error("Field '{0}' exceeds the in-memory limit")]
    FieldTooLarge(String),

    #[error("Max file size is {max}")]
    TooLarge { max: u64 },

    #[error("Failed to read upload: {0}")]
    Read(String),

    #[error(transparent)]
    Processing(#[from] ProcessError),

    #[error("Processing did not finish within {0} seconds")]
    Timeout(u64),
}

impl ScaleError {
    pub fn status(&self) -> StatusCode {
        match self {
            ScaleError::Multipart(_)
            | ScaleError::MissingImage
            | ScaleError::EmptyImage
            | ScaleError::FieldTooLarge(_) => StatusCode::BAD_REQUEST,
            ScaleError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ScaleError::Read(_) | ScaleError::Processing(_) | ScaleError::Timeout(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ScaleError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            // Detail stays in the log; the client only gets the status text.
            error!("Scale request failed: {}", self);
            return (status, "Internal Server Error").into_response();
        }

        (status, self.to_string()).into_response()
    }
}
