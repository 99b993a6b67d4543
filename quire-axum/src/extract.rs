use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRef, FromRequest, FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    Json,
};
use quire_auth::{extract_bearer_token, TokenIssuer};
use quire_core::errors::QuireError;
use quire_core::{RequestContext, TenantContext};
use serde::de::DeserializeOwned;

use crate::ApiError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn tenant_from_headers(headers: &HeaderMap) -> TenantContext {
    headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(TenantContext::new)
        .unwrap_or_default()
}

/// Build the request context from headers: tenant, request id and, when an
/// `Authorization` header is present, the verified viewer. The token must
/// have been issued in the tenant the request names.
pub fn request_context(headers: &HeaderMap, tokens: &TokenIssuer) -> Result<RequestContext, ApiError> {
    let mut ctx = RequestContext::new(tenant_from_headers(headers));

    if let Some(id) = headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
        ctx = ctx.with_request_id(id);
    }

    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| QuireError::not_authenticated("Malformed Authorization header"))?;
        let token = extract_bearer_token(value)
            .ok_or_else(|| QuireError::not_authenticated("Unsupported authorization scheme"))?;
        let claims = tokens.verify_for(&ctx.tenant, token)?;
        ctx = ctx.with_viewer(claims.viewer());
    }

    Ok(ctx)
}

/// Request context extractor. Anonymous when no token is sent; a token that
/// does not verify is rejected with 401.
#[derive(Debug, Clone)]
pub struct Session(pub RequestContext);

impl<S> FromRequestParts<S> for Session
where
    Arc<TokenIssuer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenIssuer>::from_ref(state);
        Ok(Self(request_context(&parts.headers, &tokens)?))
    }
}

/// `Json` with rejections mapped to a BadRequest body.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
