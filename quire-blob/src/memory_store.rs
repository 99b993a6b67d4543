use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::validate_key;
use crate::types::{bytes_stream, collect_stream};
use crate::{
    BlobError, BlobResult, BlobStore, ByteStream, GetResult, ObjectHead, PutResult,
    StoreCapabilities,
};

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: Option<String>,
    etag: String,
    last_modified: i64,
}

/// Process-local store. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult> {
        validate_key(key)?;
        let data = collect_stream(stream).await?;
        let etag = Uuid::new_v4().simple().to_string();
        let size_bytes = data.len() as u64;

        self.objects.write().await.insert(
            key.to_string(),
            StoredBlob {
                data,
                content_type: content_type.map(str::to_string),
                etag: etag.clone(),
                last_modified: chrono::Utc::now().timestamp(),
            },
        );

        Ok(PutResult {
            etag: Some(etag),
            size_bytes,
        })
    }

    async fn get(&self, key: &str) -> BlobResult<GetResult> {
        let objects = self.objects.read().await;
        let blob = objects.get(key).ok_or_else(|| BlobError::not_found(key))?;
        Ok(GetResult {
            stream: bytes_stream(blob.data.clone()),
            size_bytes: blob.data.len() as u64,
            content_type: blob.content_type.clone(),
            etag: Some(blob.etag.clone()),
        })
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let objects = self.objects.read().await;
        let blob = objects.get(key).ok_or_else(|| BlobError::not_found(key))?;
        Ok(ObjectHead {
            size_bytes: blob.data.len() as u64,
            content_type: blob.content_type.clone(),
            etag: Some(blob.etag.clone()),
            last_modified: Some(blob.last_modified),
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.objects
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobError::not_found(key))
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::basic().with_etag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryBlobStore::new();
        store
            .put("t/a", Some("image/png"), bytes_stream(&b"abc"[..]))
            .await
            .unwrap();

        let head = store.head("t/a").await.unwrap();
        assert_eq!(head.size_bytes, 3);
        assert_eq!(head.content_type.as_deref(), Some("image/png"));

        let got = store.get("t/a").await.unwrap();
        assert_eq!(&collect_stream(got.stream).await.unwrap()[..], b"abc");

        store.delete("t/a").await.unwrap();
        assert!(matches!(store.get("t/a").await, Err(BlobError::NotFound { .. })));
        assert!(matches!(store.delete("t/a").await, Err(BlobError::NotFound { .. })));
    }
}
