//! Request-scoped context: which tenant a call runs in and who is asking.
//!
//! Nothing in quire reads a global "current user". Every workflow receives
//! a [`RequestContext`] from its caller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::QuireError;

/// A simple tenant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(pub String);

/// Tenant scope carried with every store call.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: TenantId,
}

impl TenantContext {
    pub fn new<S: Into<String>>(tenant: S) -> Self {
        Self {
            tenant_id: TenantId(tenant.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.tenant_id.0
    }
}

impl Default for TenantContext {
    fn default() -> Self {
        Self::new("default")
    }
}

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Viewer {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub tenant: TenantContext,
    pub viewer: Option<Viewer>,
    pub request_id: String,
}

impl RequestContext {
    /// Anonymous context in `tenant`.
    pub fn new(tenant: TenantContext) -> Self {
        Self {
            tenant,
            viewer: None,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_viewer(mut self, viewer: Viewer) -> Self {
        self.viewer = Some(viewer);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.viewer.is_some()
    }

    /// The viewer, or NotAuthenticated.
    pub fn require_viewer(&self) -> Result<&Viewer, anyhow::Error> {
        self.viewer
            .as_ref()
            .ok_or_else(|| QuireError::not_authenticated("User not authenticated.").into_anyhow())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(TenantContext::default())
    }
}
