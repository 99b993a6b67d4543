//! Fixtures shared by unit tests.

use std::sync::Arc;

use quire_auth::{LocalIdentityOptions, LocalIdentityProvider, TokenIssuer, TokenOptions};
use quire_blob::{BlobAdapter, BlobConfig, MemoryBlobStore};
use quire_core::{DocumentStore, MemoryDocumentStore, RequestContext, TenantContext, Viewer, WriteBatch};

use crate::model::{to_doc, User, USERNAMES, USERS};
use crate::paths::username_key;
use crate::services::{BlogSettings, BlogState};

pub fn blog_state() -> Arc<BlogState> {
    blog_state_with(Arc::new(MemoryDocumentStore::new()), BlobAdapter::new(MemoryBlobStore::new(), blob_config()))
}

pub fn blob_config() -> BlobConfig {
    BlobConfig::new().with_public_base_url("https://cdn.test/blobs")
}

pub fn blog_state_with(docs: Arc<dyn DocumentStore>, blobs: BlobAdapter) -> Arc<BlogState> {
    let tokens = TokenIssuer::new(TokenOptions {
        secret: "unit-test-secret".to_string(),
        ..TokenOptions::default()
    })
    .unwrap();
    Arc::new(BlogState {
        docs,
        blobs: Arc::new(blobs),
        identity: Arc::new(LocalIdentityProvider::new(LocalIdentityOptions {
            // bcrypt's minimum cost keeps hashing fast in tests.
            bcrypt_cost: 4,
            ..LocalIdentityOptions::default()
        })),
        tokens: Arc::new(tokens),
        settings: BlogSettings::default(),
    })
}

pub fn viewer_ctx(uid: &str) -> RequestContext {
    RequestContext::new(TenantContext::default()).with_viewer(Viewer::new(uid))
}

pub fn anonymous_ctx() -> RequestContext {
    RequestContext::new(TenantContext::default())
}

/// Store a user record and, when given, claim its username.
pub async fn seed_user(state: &BlogState, uid: &str, username: Option<&str>) -> User {
    let mut user = User::seed(uid, uid.to_uppercase(), Some(format!("{uid}@example.com")));
    user.username = username.map(str::to_string);
    let mut batch = WriteBatch::new().create(USERS, uid, to_doc(&user).unwrap());
    if let Some(name) = username {
        batch = batch.create(USERNAMES, username_key(name), serde_json::json!({ "uid": uid }));
    }
    state.docs.commit(&TenantContext::default(), batch).await.unwrap();
    user
}
