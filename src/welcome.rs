use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Handler for /
/// Liveness probe, always answers with a fixed body
pub async fn welcome_handler() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "welcome",
    )
        .into_response()
}
