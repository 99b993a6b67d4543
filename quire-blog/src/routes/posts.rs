use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use quire_axum::{ApiError, ApiJson, Session};

use crate::model::Post;
use crate::services::posts::PublishInput;

use super::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(publish))
        .route("/{id}", get(read))
}

async fn publish(
    State(app): State<AppState>,
    Session(ctx): Session,
    ApiJson(input): ApiJson<PublishInput>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let input = PublishInput {
        draft_id: None,
        ..input
    };
    let post = app.services.posts.publish(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn read(
    State(app): State<AppState>,
    Session(ctx): Session,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(app.services.posts.get_post(&ctx, &id).await?))
}
