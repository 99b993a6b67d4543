use bytes::Bytes;
use futures_core::Stream;
use std::pin::Pin;
use uuid::Uuid;

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Wrap an in-memory buffer as a single-chunk [`ByteStream`].
pub fn bytes_stream(data: impl Into<Bytes>) -> ByteStream {
    let data = data.into();
    Box::pin(futures_util::stream::once(async move { Ok(data) }))
}

/// Context for blob operations (tenant, user, request info)
#[derive(Debug, Clone)]
pub struct BlobCtx {
    pub tenant_id: String,
    pub actor_id: Option<String>,
    pub request_id: String,
}

impl BlobCtx {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            actor_id: None,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

/// Request to store a blob at a tenant-relative path
#[derive(Debug, Clone, Default)]
pub struct BlobPut {
    pub path: String,
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub size_hint: Option<u64>,
}

impl BlobPut {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
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

    pub fn with_size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }
}

/// Drain a [`ByteStream`] into one buffer.
pub async fn collect_stream(mut stream: ByteStream) -> Result<Bytes, std::io::Error> {
    use futures_util::StreamExt;

    let mut data = bytes::BytesMut::new();
    while let Some(chunk) = stream.next().await {
        data.extend_from_slice(&chunk?);
    }
    Ok(data.freeze())
}
