use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{primitives::ByteStream as AwsByteStream, Client};

use crate::store::validate_key;
use crate::types::{bytes_stream, collect_stream};
use crate::{
    BlobError, BlobResult, BlobStore, ByteStream, GetResult, ObjectHead, PutResult,
    StoreCapabilities,
};

/// Connection settings for an S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: String,
}

impl S3Config {
    /// Read `{prefix}BUCKET`, `{prefix}REGION`, `{prefix}ACCESS_KEY_ID`,
    /// `{prefix}SECRET_ACCESS_KEY` and `{prefix}ENDPOINT_URL`.
    pub fn from_env(prefix: &str) -> BlobResult<Self> {
        let get_env = |name: &str| {
            let key = format!("{prefix}{name}");
            std::env::var(&key)
                .map_err(|_| BlobError::invalid(format!("{key} environment variable required")))
        };

        Ok(Self {
            bucket: get_env("BUCKET")?,
            region: get_env("REGION")?,
            access_key_id: get_env("ACCESS_KEY_ID")?,
            secret_access_key: get_env("SECRET_ACCESS_KEY")?,
            endpoint_url: get_env("ENDPOINT_URL")?,
        })
    }
}

/// S3-compatible store using path-style addressing
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    bucket: String,
}

impl S3CompatibleStore {
    pub async fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "quire",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint_url)
            .load()
            .await;

        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(true)
                .build(),
        );

        Self {
            client,
            bucket: config.bucket,
        }
    }

    pub async fn from_env(prefix: &str) -> BlobResult<Self> {
        Ok(Self::new(S3Config::from_env(prefix)?).await)
    }

    fn map_aws_error(err: impl std::error::Error + Send + Sync + 'static) -> BlobError {
        BlobError::backend(err)
    }
}

#[async_trait]
impl BlobStore for S3CompatibleStore {
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult> {
        validate_key(key)?;
        let data = collect_stream(stream).await?;
        let size_bytes = data.len() as u64;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(AwsByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let result = request.send().await.map_err(Self::map_aws_error)?;

        Ok(PutResult {
            etag: result.e_tag,
            size_bytes,
        })
    }

    async fn get(&self, key: &str) -> BlobResult<GetResult> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    BlobError::not_found(key)
                } else {
                    Self::map_aws_error(err)
                }
            })?;

        let body = result.body.collect().await.map_err(Self::map_aws_error)?;
        let data = body.into_bytes();

        Ok(GetResult {
            size_bytes: data.len() as u64,
            stream: bytes_stream(data),
            content_type: result.content_type,
            etag: result.e_tag,
        })
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    BlobError::not_found(key)
                } else {
                    Self::map_aws_error(err)
                }
            })?;

        Ok(ObjectHead {
            size_bytes: result.content_length.unwrap_or(0) as u64,
            content_type: result.content_type,
            etag: result.e_tag,
            last_modified: result.last_modified.map(|dt| dt.secs()),
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        // S3 deletes are idempotent; probe first so missing keys report NotFound.
        self.head(key).await?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(Self::map_aws_error)?;
        Ok(())
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::basic().durable().with_etag()
    }
}
