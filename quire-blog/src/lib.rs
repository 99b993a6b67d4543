//! quire-blog: a blogging application on the quire crates.
//!
//! Authors compose posts in an editor, keep drafts, publish them, follow
//! each other and edit their profiles. Inline images are moved out of post
//! markup into the blob store before anything is written.

pub mod app;
pub mod errors;
pub mod hashtags;
pub mod markup;
pub mod model;
pub mod pages;
pub mod paths;
pub mod routes;
pub mod services;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use quire_axum::{axum, AxumApp};
use quire_core::ConfigSnapshot;

use crate::routes::AppState;

/// Build the HTTP application from built-in defaults and the environment.
pub async fn build() -> Result<(AxumApp, ConfigSnapshot)> {
    let config = app::blog_config().snapshot();
    let app = build_with(&config).await?;
    Ok((app, config))
}

pub async fn build_with(config: &ConfigSnapshot) -> Result<AxumApp> {
    let state = app::blog_state(config).await?;
    let services = services::configure(state);
    let router = routes::router(AppState::new(services));
    Ok(axum(router).with_health())
}
