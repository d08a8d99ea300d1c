use poem::http::StatusCode;
use poem::web::Json;
use poem::{IntoResponse, Response};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

/// JSON error response: `{"error": "…"}`.
pub fn error(status: StatusCode, message: &str) -> Response {
    Json(ErrorBody { error: message })
        .with_status(status)
        .into_response()
}
