use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use quire_axum::{ApiError, Session};
use serde::Serialize;

use crate::model::PublicUser;
use crate::services::profiles::PublicProfile;

use super::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/{username}", get(profile))
        .route("/{username}/follow", post(follow).delete(unfollow))
        .route("/{username}/followers", get(followers))
        .route("/{username}/following", get(following))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileView {
    #[serde(flatten)]
    profile: PublicProfile,
    is_following: bool,
}

async fn profile(
    State(app): State<AppState>,
    Session(ctx): Session,
    Path(username): Path<String>,
) -> Result<Json<ProfileView>, ApiError> {
    let profile = app.services.profiles.public_profile(&ctx, &username).await?;
    let is_following = app.services.follows.is_following(&ctx, &profile.user.uid).await?;
    Ok(Json(ProfileView { profile, is_following }))
}

async fn follow(
    State(app): State<AppState>,
    Session(ctx): Session,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.require_viewer()?;
    let user = app.services.profiles.resolve_username(&ctx, &username).await?;
    app.services.follows.follow(&ctx, &user.uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unfollow(
    State(app): State<AppState>,
    Session(ctx): Session,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.require_viewer()?;
    let user = app.services.profiles.resolve_username(&ctx, &username).await?;
    app.services.follows.unfollow(&ctx, &user.uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn followers(
    State(app): State<AppState>,
    Session(ctx): Session,
    Path(username): Path<String>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let user = app.services.profiles.resolve_username(&ctx, &username).await?;
    let users = app.services.follows.followers(&ctx, &user.uid).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

async fn following(
    State(app): State<AppState>,
    Session(ctx): Session,
    Path(username): Path<String>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let user = app.services.profiles.resolve_username(&ctx, &username).await?;
    let users = app.services.follows.following(&ctx, &user.uid).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}
