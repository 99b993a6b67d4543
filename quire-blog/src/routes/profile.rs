use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use quire_axum::{ApiError, ApiJson, Session};
use serde::{Deserialize, Serialize};

use crate::model::User;
use crate::services::profiles::{OwnProfile, ProfileUpdate};

use super::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(own).patch(update))
        .route("/username-available", get(username_available))
}

async fn own(State(app): State<AppState>, Session(ctx): Session) -> Result<Json<OwnProfile>, ApiError> {
    Ok(Json(app.services.profiles.load_own_profile(&ctx).await?))
}

async fn update(
    State(app): State<AppState>,
    Session(ctx): Session,
    ApiJson(input): ApiJson<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(app.services.profiles.update_profile(&ctx, input).await?))
}

#[derive(Debug, Deserialize)]
struct UsernameQuery {
    #[serde(default)]
    username: String,
}

#[derive(Debug, Serialize)]
struct Availability {
    available: bool,
}

async fn username_available(
    State(app): State<AppState>,
    Session(ctx): Session,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<Availability>, ApiError> {
    let available = app
        .services
        .profiles
        .is_username_available(&ctx, &query.username)
        .await?;
    Ok(Json(Availability { available }))
}
