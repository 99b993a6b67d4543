use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::store::validate_key;
use crate::types::bytes_stream;
use crate::{
    BlobError, BlobResult, BlobStore, ByteStream, GetResult, ObjectHead, PutResult,
    StoreCapabilities,
};

/// Filesystem store rooted at a directory.
///
/// Layout: `{root}/objects/{key}` holds content and `{root}/meta/{key}`
/// holds the content type when one was given.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> BlobResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join("objects").join(key))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join("meta").join(key)
    }

    fn map_missing(key: &str, err: std::io::Error) -> BlobError {
        if err.kind() == ErrorKind::NotFound {
            BlobError::not_found(key)
        } else {
            BlobError::from(err)
        }
    }

    async fn read_content_type(&self, key: &str) -> Option<String> {
        tokio::fs::read_to_string(self.meta_path(key))
            .await
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    async fn write_stream(tmp: &Path, mut stream: ByteStream) -> BlobResult<u64> {
        let mut file = tokio::fs::File::create(tmp).await?;
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write next to the target and rename, so readers never see half a file.
        let tmp = path.with_file_name(format!(
            ".{}.{}.tmp",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("blob"),
            Uuid::new_v4().simple()
        ));
        let size_bytes = match Self::write_stream(&tmp, stream).await {
            Ok(size) => size,
            Err(err) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(err);
            }
        };
        tokio::fs::rename(&tmp, &path).await?;

        let meta = self.meta_path(key);
        match content_type {
            Some(ct) => {
                if let Some(parent) = meta.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&meta, ct).await?;
            }
            None => {
                let _ = tokio::fs::remove_file(&meta).await;
            }
        }

        Ok(PutResult {
            etag: None,
            size_bytes,
        })
    }

    async fn get(&self, key: &str) -> BlobResult<GetResult> {
        let path = self.object_path(key)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| Self::map_missing(key, e))?;
        Ok(GetResult {
            size_bytes: data.len() as u64,
            stream: bytes_stream(data),
            content_type: self.read_content_type(key).await,
            etag: None,
        })
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let path = self.object_path(key)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Self::map_missing(key, e))?;
        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);
        Ok(ObjectHead {
            size_bytes: metadata.len(),
            content_type: self.read_content_type(key).await,
            etag: None,
            last_modified,
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let path = self.object_path(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| Self::map_missing(key, e))?;
        let _ = tokio::fs::remove_file(self.meta_path(key)).await;
        Ok(())
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::basic().durable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::collect_stream;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("quire-blob-{}", Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn stores_content_and_type_on_disk() {
        let root = temp_root();
        let store = FsBlobStore::new(root.clone());

        store
            .put("default/profileImages/u1/me.png", Some("image/png"), bytes_stream(&b"png"[..]))
            .await
            .unwrap();

        let got = store.get("default/profileImages/u1/me.png").await.unwrap();
        assert_eq!(got.content_type.as_deref(), Some("image/png"));
        assert_eq!(&collect_stream(got.stream).await.unwrap()[..], b"png");

        store.delete("default/profileImages/u1/me.png").await.unwrap();
        assert!(matches!(
            store.head("default/profileImages/u1/me.png").await,
            Err(BlobError::NotFound { .. })
        ));

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let store = FsBlobStore::new(temp_root());
        let err = store
            .put("default/../../escape", None, bytes_stream(&b"x"[..]))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::Invalid { .. }));
    }
}
