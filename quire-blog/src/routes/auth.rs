use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use quire_auth::ExternalProfile;
use quire_axum::{ApiError, ApiJson, Session};

use crate::services::accounts::{AuthSession, LoginInput, RegisterInput};

use super::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/external", post(external))
        .route("/login", post(login))
}

async fn register(
    State(app): State<AppState>,
    Session(ctx): Session,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let session = app.services.accounts.register_with_password(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// The profile is asserted by a front end that already completed the
/// provider's own sign-in flow.
async fn external(
    State(app): State<AppState>,
    Session(ctx): Session,
    ApiJson(profile): ApiJson<ExternalProfile>,
) -> Result<Json<AuthSession>, ApiError> {
    Ok(Json(app.services.accounts.sign_in_with_provider(&ctx, profile).await?))
}

async fn login(
    State(app): State<AppState>,
    Session(ctx): Session,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<AuthSession>, ApiError> {
    Ok(Json(app.services.accounts.login(&ctx, input).await?))
}
