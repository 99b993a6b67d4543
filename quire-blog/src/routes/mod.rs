//! HTTP/JSON routes over the workflow services.
//!
//! Handlers extract a [`Session`](quire_axum::Session) (tenant, request id
//! and the bearer-token viewer when present), call one service operation
//! and return its result as JSON. Errors become [`ApiError`] responses.

mod auth;
mod blobs;
mod drafts;
mod posts;
mod profile;
mod users;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::Router;
use quire_auth::TokenIssuer;

use crate::services::BlogServices;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub services: BlogServices,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(services: BlogServices) -> Self {
        let tokens = Arc::clone(&services.state.tokens);
        Self { services, tokens }
    }
}

pub fn router(state: AppState) -> Router<()> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/drafts", drafts::routes())
        .nest("/posts", posts::routes())
        .nest("/profile", profile::routes())
        .nest("/users", users::routes())
        .nest("/blobs", blobs::routes())
        .with_state(state)
}
