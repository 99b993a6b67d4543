//! quire-core: shared building blocks for quire.
//!
//! - [`errors`]: structured errors carried through `anyhow`
//! - [`config`]: key/value configuration with env overrides
//! - [`tenant`]: tenant and request context passed into every call
//! - [`store`] / [`batch`]: document store trait with atomic write batches
//! - [`memory`]: in-process document store

pub mod batch;
pub mod config;
pub mod errors;
pub mod memory;
pub mod store;
pub mod tenant;

pub use batch::{WriteBatch, WriteOp};
pub use config::{ConfigSnapshot, QuireConfig};
pub use errors::{ErrorKind, QuireError, QuireResult};
pub use memory::MemoryDocumentStore;
pub use store::{DocumentStore, Filter};
pub use tenant::{RequestContext, TenantContext, TenantId, Viewer};
