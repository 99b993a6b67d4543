use std::io;
use std::sync::Arc;

use futures_util::StreamExt;

use crate::store::validate_key;
use crate::types::bytes_stream;
use crate::{
    BlobConfig, BlobCtx, BlobError, BlobPut, BlobReceipt, BlobResult, BlobStore, ByteStream,
    DataUrl, OpenedBlob,
};

/// The blob adapter workflows embed.
///
/// Callers address blobs by tenant-relative path; the adapter prefixes
/// the tenant to form the store key, enforces the size guard and turns
/// keys into public URLs.
#[derive(Clone)]
pub struct BlobAdapter {
    store: Arc<dyn BlobStore>,
    config: BlobConfig,
}

impl BlobAdapter {
    /// Create a new blob adapter
    pub fn new<S: BlobStore + 'static>(store: S, config: BlobConfig) -> Self {
        Self::from_arc(Arc::new(store), config)
    }

    pub fn from_arc(store: Arc<dyn BlobStore>, config: BlobConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// `{tenant}/{path}`
    pub fn object_key(&self, ctx: &BlobCtx, path: &str) -> BlobResult<String> {
        validate_key(&ctx.tenant_id)?;
        validate_key(path)?;
        Ok(format!("{}/{}", ctx.tenant_id, path))
    }

    pub fn url_for_key(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_base_url, key)
    }

    /// Resolve a URL this adapter issued back to its key. URLs from
    /// elsewhere, or from another tenant, are Invalid.
    pub fn key_from_url(&self, ctx: &BlobCtx, url: &str) -> BlobResult<String> {
        let key = url
            .strip_prefix(&self.config.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| BlobError::invalid(format!("Not a blob URL issued here: {url}")))?;
        let tenant_prefix = format!("{}/", ctx.tenant_id);
        if !key.starts_with(&tenant_prefix) {
            return Err(BlobError::invalid(format!(
                "Blob URL belongs to another tenant: {url}"
            )));
        }
        validate_key(key)?;
        Ok(key.to_string())
    }

    /// Store a blob from a stream (single-shot upload)
    pub async fn put(&self, ctx: &BlobCtx, put: BlobPut, body: ByteStream) -> BlobResult<BlobReceipt> {
        let max = self.config.max_blob_bytes;
        if let Some(size) = put.size_hint {
            if size > max {
                return Err(BlobError::TooLarge { size, max });
            }
        }

        let key = self.object_key(ctx, &put.path)?;
        let result = self
            .store
            .put(&key, put.content_type.as_deref(), limit_stream(body, max))
            .await
            .map_err(|err| match err {
                BlobError::Io { source }
                    if source
                        .get_ref()
                        .is_some_and(|inner| inner.is::<SizeLimitExceeded>()) =>
                {
                    BlobError::TooLarge { size: max + 1, max }
                }
                other => other,
            })?;

        let mut receipt = BlobReceipt::new(key.clone(), put.path, self.url_for_key(&key), result.size_bytes);
        if let Some(ct) = put.content_type {
            receipt = receipt.with_content_type(ct);
        }
        if let Some(filename) = put.filename {
            receipt = receipt.with_filename(filename);
        }
        if let Some(etag) = result.etag {
            receipt = receipt.with_etag(etag);
        }
        Ok(receipt)
    }

    /// Decode a `data:` URL and store its payload at `path`.
    pub async fn put_data_url(&self, ctx: &BlobCtx, path: &str, data_url: &str) -> BlobResult<BlobReceipt> {
        let decoded = DataUrl::parse(data_url)?;
        let put = BlobPut::new(path)
            .with_content_type(decoded.mime.clone())
            .with_size_hint(decoded.len() as u64);
        self.put(ctx, put, bytes_stream(decoded.data)).await
    }

    /// Open a blob for reading by store key
    pub async fn open(&self, key: &str) -> BlobResult<OpenedBlob> {
        validate_key(key)?;
        let got = self.store.get(key).await?;
        Ok(OpenedBlob {
            key: key.to_string(),
            size_bytes: got.size_bytes,
            content_type: got.content_type,
            etag: got.etag,
            stream: got.stream,
        })
    }

    /// Delete a blob by tenant-relative path
    pub async fn delete(&self, ctx: &BlobCtx, path: &str) -> BlobResult<()> {
        let key = self.object_key(ctx, path)?;
        self.store.delete(&key).await
    }

    pub async fn delete_key(&self, key: &str) -> BlobResult<()> {
        validate_key(key)?;
        self.store.delete(key).await
    }

    /// Delete a blob by a URL previously returned in a receipt
    pub async fn delete_by_url(&self, ctx: &BlobCtx, url: &str) -> BlobResult<()> {
        let key = self.key_from_url(ctx, url)?;
        self.store.delete(&key).await
    }
}

#[derive(Debug, thiserror::Error)]
#[error("blob exceeds {max} bytes")]
struct SizeLimitExceeded {
    max: u64,
}

/// Fail the stream once more than `max` bytes have passed through.
fn limit_stream(mut body: ByteStream, max: u64) -> ByteStream {
    Box::pin(async_stream::stream! {
        let mut seen = 0u64;
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    seen += bytes.len() as u64;
                    if seen > max {
                        yield Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            SizeLimitExceeded { max },
                        ));
                        break;
                    }
                    yield Ok(bytes);
                }
                Err(err) => {
                    yield Err(err);
                    break;
                }
            }
        }
    })
}
