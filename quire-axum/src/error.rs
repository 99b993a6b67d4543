use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quire_core::errors::QuireError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<QuireError> for ApiError {
    fn from(e: QuireError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        QuireError::bad_request("Failed to parse the request body as JSON")
            .with_errors(json!({"_schema": [rejection.body_text()]}))
            .into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // A QuireError anywhere in the chain keeps its kind and fields.
        let safe = match QuireError::from_anyhow(&self.0) {
            Some(quire) => quire.sanitize_for_client(),
            None => QuireError::general_error("An unexpected error occurred."),
        };
        let status =
            StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = ?self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), message = %safe.message, "request rejected");
        }

        (status, Json(safe.to_json())).into_response()
    }
}
