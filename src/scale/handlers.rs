use crate::{AppState, UploadConfig, diagnostics};
use axum::{
    extract::{
        Multipart, Query, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::time::Duration;
use tracing::debug;

use super::error::{ProcessError, ScaleError};
use super::options;
use super::processor::SharedProcessor;
use super::types::{ProcessingOptions, ScaleQuery};

/// Name of the multipart field carrying the upload.
pub const IMAGE_FIELD: &str = "image";

/// POST handler: resize/convert the uploaded `image` field.
///
/// `width`, `height` and `format` are optional query parameters. Values that
/// do not parse fall back to defaults (0 = auto, JPEG) instead of failing,
/// and a repeated key keeps its first value.
#[axum::debug_handler]
pub async fn scale_handler(
    State(app_state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    diagnostics::log_memory_usage("scale:start");
    let query = ScaleQuery::from_pairs(params);
    let response = match scale(&app_state, query, multipart).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };
    diagnostics::log_memory_usage("scale:end");
    response
}

async fn scale(
    app_state: &AppState,
    query: ScaleQuery,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ScaleError> {
    let mut multipart = multipart.map_err(|rejection| ScaleError::Multipart(rejection.body_text()))?;

    let input = read_upload(&mut multipart, &app_state.config.upload).await?;
    if input.is_empty() {
        return Err(ScaleError::EmptyImage);
    }

    let options = options::resolve(
        query.width.as_deref(),
        query.height.as_deref(),
        query.format.as_deref(),
        &app_state.config.processing,
    );
    debug!(
        "Processing {} byte upload: {}x{} as {:?}",
        input.len(),
        options.width,
        options.height,
        options.format
    );

    let content_type = options.format.mime_type();
    let output = run_processor(
        app_state.processor.clone(),
        input,
        options,
        app_state.config.processing.processing_timeout_secs,
    )
    .await?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, content_type)], output).into_response())
}

/// Read the first `image` field fully into memory.
///
/// The rest of the form is still drained so framing errors anywhere in the
/// body are reported. Non-file fields may hold at most `max_memory` bytes.
async fn read_upload(
    multipart: &mut Multipart,
    limits: &UploadConfig,
) -> Result<Vec<u8>, ScaleError> {
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limits.max_file_size))?
    {
        if image.is_none() && field.name() == Some(IMAGE_FIELD) {
            image = Some(read_image_field(field, limits).await?);
        } else {
            discard_field(field, limits).await?;
        }
    }

    image.ok_or(ScaleError::MissingImage)
}

async fn read_image_field(
    mut field: Field<'_>,
    limits: &UploadConfig,
) -> Result<Vec<u8>, ScaleError> {
    let max = limits.max_file_size;
    let declared = declared_size(field.headers());

    if let Some(declared) = declared
        && declared > max
    {
        debug!("Rejecting upload declaring {} bytes", declared);
        return Err(ScaleError::TooLarge { max });
    }

    let initial_capacity = declared.unwrap_or(0).min(limits.max_memory);
    let mut buffer = Vec::with_capacity(usize::try_from(initial_capacity).unwrap_or(0));

    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, max))? {
        if buffer.len() as u64 + chunk.len() as u64 > max {
            debug!("Upload exceeded {} bytes while streaming", max);
            return Err(ScaleError::TooLarge { max });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}

async fn discard_field(mut field: Field<'_>, limits: &UploadConfig) -> Result<(), ScaleError> {
    let name = field.name().unwrap_or_default().to_string();
    // File parts are only bounded by the request body limit.
    let is_file = field.file_name().is_some();
    let mut size: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, limits.max_file_size))?
    {
        size += chunk.len() as u64;
        if !is_file && size > limits.max_memory {
            return Err(ScaleError::FieldTooLarge(name));
        }
    }

    debug!("Ignoring form field '{}' ({} bytes)", name, size);
    Ok(())
}

/// Size the client declared for a part, if it sent a Content-Length header.
pub(crate) fn declared_size(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Classify a multipart failure by the status axum assigns it.
///
/// Malformed framing is the client's fault (400), the body limit is 413,
/// and anything else is a failure reading the connection.
fn multipart_error(err: MultipartError, max: u64) -> ScaleError {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ScaleError::TooLarge { max }
    } else if status.is_client_error() {
        ScaleError::Multipart(err.body_text())
    } else {
        ScaleError::Read(err.body_text())
    }
}

/// Run the processor on the blocking pool, optionally bounded by a timeout.
///
/// On timeout the blocking task keeps running to completion; only the
/// response is abandoned.
async fn run_processor(
    processor: SharedProcessor,
    input: Vec<u8>,
    options: ProcessingOptions,
    timeout_secs: Option<u64>,
) -> Result<Vec<u8>, ScaleError> {
    let task = tokio::task::spawn_blocking(move || processor.process(&input, &options));

    let joined = match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), task)
            .await
            .map_err(|_| ScaleError::Timeout(secs))?,
        None => task.await,
    };

    Ok(joined.map_err(|e| ProcessError::Task(e.to_string()))??)
}
