use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use quire_axum::ApiError;

use crate::errors::blob_error;

use super::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/{*key}", get(serve))
}

/// Blobs are rendered as inert content: no sniffing, no script, no framing.
const BLOB_CSP: &str = "default-src 'none'; sandbox";

/// Stream a stored blob. Keys are the tenant-qualified paths found in the
/// public URLs the adapter hands out.
async fn serve(State(app): State<AppState>, Path(key): Path<String>) -> Result<Response, ApiError> {
    let opened = app.services.state.blobs.open(&key).await.map_err(blob_error)?;
    tracing::debug!(key = %opened.key, size = opened.size_bytes, "serving blob");

    let content_type = opened.content_type_or_default().to_string();
    let mut response = (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, opened.size_bytes.to_string()),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            (header::CONTENT_SECURITY_POLICY, BLOB_CSP.to_string()),
        ],
        Body::from_stream(opened.stream),
    )
        .into_response();
    if let Some(etag) = opened.etag.as_deref().and_then(|etag| etag.parse().ok()) {
        response.headers_mut().insert(header::ETAG, etag);
    }
    Ok(response)
}
