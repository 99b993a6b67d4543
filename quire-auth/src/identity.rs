use async_trait::async_trait;
use quire_core::TenantContext;
use serde::{Deserialize, Serialize};

use crate::IdentityError;

/// An authenticated account as the provider sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// `password` for local accounts, the provider name otherwise.
    pub provider: String,
}

/// Profile asserted by a third-party identity provider after its own
/// sign-in flow completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalProfile {
    pub provider: String,
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl ExternalProfile {
    /// `{provider}:{subject}`
    pub fn uid(&self) -> String {
        format!("{}:{}", self.provider, self.subject)
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_with_password(
        &self,
        tenant: &TenantContext,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, IdentityError>;

    async fn sign_in_with_password(
        &self,
        tenant: &TenantContext,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError>;

    /// Returns the identity for `profile`, creating it on first sign-in.
    async fn sign_in_with_external(
        &self,
        tenant: &TenantContext,
        profile: ExternalProfile,
    ) -> Result<Identity, IdentityError>;
}
