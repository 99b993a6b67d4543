use std::sync::Arc;
use std::time::Duration;

use quire_auth::{IdentityProvider, TokenIssuer};
use quire_blob::{BlobAdapter, BlobCtx};
use quire_core::{DocumentStore, RequestContext};

/// Tunables read from configuration.
#[derive(Debug, Clone)]
pub struct BlogSettings {
    /// How long transient page banners stay up.
    pub banner_clear_after: Duration,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            banner_clear_after: Duration::from_millis(3000),
        }
    }
}

/// Shared handles every service works against. Built once at startup and
/// handed to each service explicitly.
pub struct BlogState {
    pub docs: Arc<dyn DocumentStore>,
    pub blobs: Arc<BlobAdapter>,
    pub identity: Arc<dyn IdentityProvider>,
    pub tokens: Arc<TokenIssuer>,
    pub settings: BlogSettings,
}

impl BlogState {
    pub fn blob_ctx(&self, ctx: &RequestContext) -> BlobCtx {
        let blob = BlobCtx::new(ctx.tenant.as_str()).with_request_id(ctx.request_id.clone());
        match &ctx.viewer {
            Some(viewer) => blob.with_actor(viewer.uid.clone()),
            None => blob,
        }
    }
}
