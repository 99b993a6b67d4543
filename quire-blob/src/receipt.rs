use serde::{Deserialize, Serialize};

use crate::ByteStream;

/// Receipt returned after successfully storing a blob
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobReceipt {
    /// Store key, `{tenant}/{path}`
    pub key: String,
    /// Tenant-relative path the caller asked for
    pub path: String,
    /// Durable public reference
    pub url: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub etag: Option<String>,
    pub created_at: i64,
}

impl BlobReceipt {
    /// Create a new blob receipt
    pub fn new(key: String, path: String, url: String, size_bytes: u64) -> Self {
        Self {
            key,
            path,
            url,
            size_bytes,
            content_type: None,
            filename: None,
            etag: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_etag<S: Into<String>>(mut self, etag: S) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// Result of opening a blob for reading
pub struct OpenedBlob {
    pub key: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub stream: ByteStream,
}

impl OpenedBlob {
    pub fn content_type_or_default(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }
}
