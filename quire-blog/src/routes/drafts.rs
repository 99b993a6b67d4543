use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use quire_axum::{ApiError, ApiJson, Session};

use crate::model::{Draft, Post};
use crate::services::posts::{DraftInput, PublishInput};

use super::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(load).put(overwrite).delete(remove))
        .route("/{id}/publish", post(publish))
}

async fn list(State(app): State<AppState>, Session(ctx): Session) -> Result<Json<Vec<Draft>>, ApiError> {
    Ok(Json(app.services.posts.list_drafts(&ctx).await?))
}

async fn create(
    State(app): State<AppState>,
    Session(ctx): Session,
    ApiJson(input): ApiJson<DraftInput>,
) -> Result<(StatusCode, Json<Draft>), ApiError> {
    let input = DraftInput { id: None, ..input };
    let draft = app.services.posts.save_draft(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(draft)))
}

async fn load(
    State(app): State<AppState>,
    Session(ctx): Session,
    Path(id): Path<String>,
) -> Result<Json<Draft>, ApiError> {
    Ok(Json(app.services.posts.load_draft(&ctx, &id).await?))
}

async fn overwrite(
    State(app): State<AppState>,
    Session(ctx): Session,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<DraftInput>,
) -> Result<Json<Draft>, ApiError> {
    let input = DraftInput { id: Some(id), ..input };
    Ok(Json(app.services.posts.save_draft(&ctx, input).await?))
}

async fn remove(
    State(app): State<AppState>,
    Session(ctx): Session,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    app.services.posts.delete_draft(&ctx, Some(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Publish the draft. An empty body publishes the stored draft as it is;
/// otherwise the body carries the editor's current contents.
async fn publish(
    State(app): State<AppState>,
    Session(ctx): Session,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PublishInput>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let input = if input.is_empty() {
        let draft = app.services.posts.load_draft(&ctx, &id).await?;
        PublishInput {
            draft_id: Some(id),
            title: draft.title,
            content: draft.content,
            hashtags: draft.hashtags,
        }
    } else {
        PublishInput {
            draft_id: Some(id),
            ..input
        }
    };
    let post = app.services.posts.publish(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}
