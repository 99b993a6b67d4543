use std::sync::Arc;

use anyhow::Result;
use quire_auth::{ExternalProfile, Identity};
use quire_core::errors::QuireError;
use quire_core::{ErrorKind, RequestContext, WriteBatch};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::identity_error;
use crate::model::{from_doc, to_doc, User, USERS};
use crate::services::BlogState;

pub const MISSING_FIELDS: &str = "Name, email and password are required.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A signed-in identity, its session token and user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub identity: Identity,
    pub user: User,
}

/// Registration and sign-in.
pub struct AccountsService {
    state: Arc<BlogState>,
}

impl AccountsService {
    pub fn new(state: Arc<BlogState>) -> Self {
        Self { state }
    }

    /// Create an email/password identity and seed its user record.
    pub async fn register_with_password(&self, ctx: &RequestContext, input: RegisterInput) -> Result<AuthSession> {
        let mut missing = Map::new();
        for (field, value) in [
            ("name", &input.name),
            ("email", &input.email),
            ("password", &input.password),
        ] {
            if value.trim().is_empty() {
                missing.insert(field.to_string(), Value::from(vec!["required"]));
            }
        }
        if !missing.is_empty() {
            return Err(QuireError::unprocessable(MISSING_FIELDS)
                .with_errors(Value::Object(missing))
                .into_anyhow());
        }

        let name = input.name.trim();
        let identity = self
            .state
            .identity
            .create_with_password(&ctx.tenant, input.email.trim(), &input.password, Some(name))
            .await
            .map_err(identity_error)?;
        tracing::info!(user_id = %identity.uid, "account registered");

        self.open_session(ctx, identity, name).await
    }

    /// Sign in with a profile asserted by an external identity provider.
    pub async fn sign_in_with_provider(&self, ctx: &RequestContext, profile: ExternalProfile) -> Result<AuthSession> {
        let identity = self
            .state
            .identity
            .sign_in_with_external(&ctx.tenant, profile)
            .await
            .map_err(identity_error)?;
        tracing::info!(user_id = %identity.uid, provider = %identity.provider, "external sign-in");
        let name = identity.display_name.clone().unwrap_or_default();
        self.open_session(ctx, identity, &name).await
    }

    pub async fn login(&self, ctx: &RequestContext, input: LoginInput) -> Result<AuthSession> {
        let identity = self
            .state
            .identity
            .sign_in_with_password(&ctx.tenant, input.email.trim(), &input.password)
            .await
            .map_err(identity_error)?;
        tracing::debug!(user_id = %identity.uid, "password login");
        let name = identity.display_name.clone().unwrap_or_default();
        self.open_session(ctx, identity, &name).await
    }

    async fn open_session(&self, ctx: &RequestContext, identity: Identity, name: &str) -> Result<AuthSession> {
        let user = self.ensure_user(ctx, &identity, name).await?;
        let token = self.state.tokens.issue(&ctx.tenant, &identity)?;
        Ok(AuthSession {
            token,
            identity,
            user,
        })
    }

    /// Seed the user record with a conditional create; an existing record
    /// is left as it is.
    async fn ensure_user(&self, ctx: &RequestContext, identity: &Identity, name: &str) -> Result<User> {
        let seed = User::seed(identity.uid.clone(), name, identity.email.clone());
        let batch = WriteBatch::new().create(USERS, identity.uid.clone(), to_doc(&seed)?);
        match self.state.docs.commit(&ctx.tenant, batch).await {
            Ok(()) => {
                tracing::info!(user_id = %identity.uid, "user record seeded");
                Ok(seed)
            }
            Err(err) if QuireError::kind_of(&err) == Some(ErrorKind::Conflict) => {
                let doc = self
                    .state
                    .docs
                    .get(&ctx.tenant, USERS, &identity.uid)
                    .await?
                    .ok_or_else(|| QuireError::general_error("User record vanished").into_anyhow())?;
                from_doc(doc)
            }
            Err(err) => Err(err),
        }
    }
}
