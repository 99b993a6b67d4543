//! quire-auth: identity providers and session tokens.
//!
//! - [`IdentityProvider`] creates and signs in identities and reports
//!   failures as [`IdentityError`] codes (`auth/weak-password`, ...)
//! - [`LocalIdentityProvider`] keeps bcrypt-hashed accounts in process
//! - [`TokenIssuer`] signs HS256 session tokens for signed-in identities

pub mod error;
pub mod identity;
pub mod jwt;
pub mod local;

pub use error::IdentityError;
pub use identity::{ExternalProfile, Identity, IdentityProvider};
pub use jwt::{extract_bearer_token, SessionClaims, TokenIssuer, TokenOptions};
pub use local::{LocalIdentityOptions, LocalIdentityProvider};
