use std::sync::Arc;

use anyhow::Result;
use quire_auth::{LocalIdentityOptions, LocalIdentityProvider, TokenIssuer, TokenOptions};
use quire_blob::{BlobAdapter, BlobConfig, FsBlobStore, MemoryBlobStore};
use quire_core::{ConfigSnapshot, MemoryDocumentStore, QuireConfig};

use crate::services::{BlogSettings, BlogState};

const DEV_JWT_SECRET: &str = "quire-dev-secret-change-me";

/// Built-in defaults, overridden by `QUIRE__*` environment variables.
pub fn blog_config() -> QuireConfig {
    let mut config = QuireConfig::with_defaults([
        ("http.host", "127.0.0.1"),
        ("http.port", "3036"),
        ("banner.clear_after_ms", "3000"),
        ("auth.min_password_len", "6"),
        ("auth.jwt_ttl_secs", "86400"),
        ("auth.bcrypt_cost", "10"),
        ("blob.public_base_url", "http://127.0.0.1:3036/blobs"),
        ("blob.max_bytes", "10485760"),
    ]);
    config.load_env("QUIRE");
    config
}

pub async fn blog_state(config: &ConfigSnapshot) -> Result<Arc<BlogState>> {
    let defaults = LocalIdentityOptions::default();
    let identity = LocalIdentityProvider::new(LocalIdentityOptions {
        min_password_len: config
            .get_usize("auth.min_password_len")
            .unwrap_or(defaults.min_password_len),
        bcrypt_cost: config.get_u32("auth.bcrypt_cost").unwrap_or(defaults.bcrypt_cost),
    });

    let secret = match config.get_string("auth.jwt_secret") {
        Some(secret) => secret,
        None => {
            tracing::warn!("auth.jwt_secret is not set; using the development secret");
            DEV_JWT_SECRET.to_string()
        }
    };
    let token_defaults = TokenOptions::default();
    let tokens = TokenIssuer::new(TokenOptions {
        secret,
        ttl_secs: config
            .get_u64("auth.jwt_ttl_secs")
            .map(|secs| secs as i64)
            .unwrap_or(token_defaults.ttl_secs),
        ..token_defaults
    })?;

    let mut blob_config = BlobConfig::new();
    if let Some(url) = config.get_string("blob.public_base_url") {
        blob_config = blob_config.with_public_base_url(url);
    }
    if let Some(max) = config.get_u64("blob.max_bytes") {
        blob_config = blob_config.with_max_blob_bytes(max);
    }
    let blobs = blob_adapter(config, blob_config).await?;

    let mut settings = BlogSettings::default();
    if let Some(clear_after) = config.get_duration_ms("banner.clear_after_ms") {
        settings.banner_clear_after = clear_after;
    }

    Ok(Arc::new(BlogState {
        docs: Arc::new(MemoryDocumentStore::new()),
        blobs: Arc::new(blobs),
        identity: Arc::new(identity),
        tokens: Arc::new(tokens),
        settings,
    }))
}

/// `blob.backend = "s3"` (with the `s3` feature) reads the bucket from
/// `QUIRE_S3_*`; otherwise `blob.root` selects a filesystem store and the
/// fallback is memory.
async fn blob_adapter(config: &ConfigSnapshot, blob_config: BlobConfig) -> Result<BlobAdapter> {
    #[cfg(feature = "s3")]
    if config.get("blob.backend") == Some("s3") {
        let s3 = quire_blob::S3Config::from_env("QUIRE_S3_")?;
        tracing::info!(bucket = %s3.bucket, "s3-compatible blob store");
        let store = quire_blob::S3CompatibleStore::new(s3).await;
        return Ok(BlobAdapter::new(store, blob_config));
    }

    Ok(match config.get_string("blob.root") {
        Some(root) => {
            tracing::info!(root = %root, "filesystem blob store");
            BlobAdapter::new(FsBlobStore::new(root), blob_config)
        }
        None => {
            tracing::info!("in-memory blob store");
            BlobAdapter::new(MemoryBlobStore::new(), blob_config)
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn config_values_reach_the_state() {
        let mut config = QuireConfig::with_defaults([
            ("banner.clear_after_ms", "500"),
            ("auth.bcrypt_cost", "4"),
            ("auth.jwt_secret", "s3cret"),
            ("blob.public_base_url", "https://cdn.example.com/b/"),
        ]);
        config.set("blob.max_bytes", "1024");

        let state = blog_state(&config.snapshot()).await.unwrap();

        assert_eq!(state.settings.banner_clear_after, Duration::from_millis(500));
        assert_eq!(state.blobs.config().public_base_url, "https://cdn.example.com/b");
        assert_eq!(state.blobs.config().max_blob_bytes, 1024);
    }

    #[tokio::test]
    async fn missing_secret_falls_back_to_the_dev_secret() {
        let state = blog_state(&QuireConfig::new().snapshot()).await.unwrap();
        assert_eq!(state.settings.banner_clear_after, Duration::from_millis(3000));
    }
}
