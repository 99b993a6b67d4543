//! quire-axum: Axum adapter for quire.
//!
//! Maps `QuireError`s to JSON responses, extracts the request context
//! (tenant, request id, session) and wires the standard layers.

pub mod app;
pub mod extract;
mod error;

pub use error::ApiError;
pub use extract::{request_context, tenant_from_headers, ApiJson, Session};

pub use app::{axum, AxumApp};
