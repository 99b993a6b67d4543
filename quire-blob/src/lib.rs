//! # quire-blob: object storage for quire
//!
//! Workflows store binary content (inline post images, avatars) through a
//! [`BlobAdapter`], which sits on top of any [`BlobStore`]:
//!
//! ```text
//! ┌─────────────────┐
//! │    Workflow     │  ← business logic only
//! ├─────────────────┤
//! │   BlobAdapter   │  ← tenant keys, size guard, public URLs
//! ├─────────────────┤
//! │   BlobStore     │  ← memory / filesystem / S3-compatible
//! └─────────────────┘
//! ```
//!
//! ```rust
//! use quire_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let blobs = BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::default());
//! let ctx = BlobCtx::new("default");
//!
//! let receipt = blobs
//!     .put_data_url(&ctx, "images/1700000000000-a1", "data:image/gif;base64,R0lGODlh")
//!     .await?;
//! assert!(receipt.url.ends_with("/default/images/1700000000000-a1"));
//! # Ok(())
//! # }
//! ```

pub mod adapter;
mod config;
mod data_url;
mod error;
mod fs_store;
mod memory_store;
mod receipt;
#[cfg(feature = "s3")]
mod s3_store;
pub mod store;
mod types;

pub use adapter::BlobAdapter;
pub use config::BlobConfig;
pub use data_url::{is_raster_image, DataUrl};
pub use error::{BlobError, BlobResult};
pub use fs_store::FsBlobStore;
pub use memory_store::MemoryBlobStore;
pub use receipt::{BlobReceipt, OpenedBlob};
#[cfg(feature = "s3")]
pub use s3_store::{S3CompatibleStore, S3Config};
pub use store::{BlobStore, GetResult, ObjectHead, PutResult, StoreCapabilities};
pub use types::{bytes_stream, collect_stream, BlobCtx, BlobPut, ByteStream};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobAdapter, BlobConfig, BlobCtx, BlobError, BlobPut, BlobReceipt, BlobResult, BlobStore,
        ByteStream, MemoryBlobStore,
    };
}
