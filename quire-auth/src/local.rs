//! In-process identity provider: email/password accounts hashed with
//! bcrypt, plus accounts created from external identity-provider profiles.

use std::collections::HashMap;

use async_trait::async_trait;
use bcrypt::{hash, verify};
use quire_core::TenantContext;
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::{ExternalProfile, Identity, IdentityError, IdentityProvider};

#[derive(Clone, Debug)]
pub struct LocalIdentityOptions {
    pub min_password_len: usize,
    pub bcrypt_cost: u32,
}

impl Default for LocalIdentityOptions {
    fn default() -> Self {
        Self {
            min_password_len: 6,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Validate)]
struct EmailAddress {
    #[validate(email)]
    email: String,
}

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password_hash: String,
}

type TenantKey = (String, String);

#[derive(Default)]
pub struct LocalIdentityProvider {
    options: LocalIdentityOptions,
    // (tenant, lower-cased email)
    accounts: RwLock<HashMap<TenantKey, Account>>,
    // (tenant, uid)
    external: RwLock<HashMap<TenantKey, Identity>>,
}

impl LocalIdentityProvider {
    pub fn new(options: LocalIdentityOptions) -> Self {
        Self {
            options,
            accounts: RwLock::new(HashMap::new()),
            external: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &LocalIdentityOptions {
        &self.options
    }

    fn normalize_email(email: &str) -> Result<String, IdentityError> {
        let email = email.trim().to_lowercase();
        EmailAddress {
            email: email.clone(),
        }
        .validate()
        .map_err(|_| IdentityError::InvalidEmail)?;
        Ok(email)
    }

    async fn hash_password(&self, password: &str) -> Result<String, IdentityError> {
        let password = password.to_string();
        let cost = self.options.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .map_err(|e| IdentityError::Internal(e.to_string()))?
            .map_err(IdentityError::from)
    }

    async fn compare_password(password: &str, password_hash: &str) -> Result<bool, IdentityError> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || verify(password, &password_hash))
            .await
            .map_err(|e| IdentityError::Internal(e.to_string()))?
            .map_err(IdentityError::from)
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn create_with_password(
        &self,
        tenant: &TenantContext,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, IdentityError> {
        let email = Self::normalize_email(email)?;
        if password.chars().count() < self.options.min_password_len {
            return Err(IdentityError::WeakPassword {
                min: self.options.min_password_len,
            });
        }

        let key = (tenant.as_str().to_string(), email.clone());
        if self.accounts.read().await.contains_key(&key) {
            return Err(IdentityError::EmailAlreadyInUse);
        }

        let password_hash = self.hash_password(password).await?;
        let identity = Identity {
            uid: Uuid::new_v4().simple().to_string(),
            email: Some(email),
            display_name: display_name.map(str::to_string),
            provider: "password".to_string(),
        };

        let mut accounts = self.accounts.write().await;
        // Re-check under the write lock; hashing happened without it.
        if accounts.contains_key(&key) {
            return Err(IdentityError::EmailAlreadyInUse);
        }
        accounts.insert(
            key,
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );
        tracing::info!(uid = %identity.uid, tenant = %tenant.as_str(), "identity created");
        Ok(identity)
    }

    async fn sign_in_with_password(
        &self,
        tenant: &TenantContext,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        let email = Self::normalize_email(email)?;
        let key = (tenant.as_str().to_string(), email);
        let account = self
            .accounts
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or(IdentityError::InvalidCredential)?;

        if !Self::compare_password(password, &account.password_hash).await? {
            return Err(IdentityError::InvalidCredential);
        }
        Ok(account.identity)
    }

    async fn sign_in_with_external(
        &self,
        tenant: &TenantContext,
        profile: ExternalProfile,
    ) -> Result<Identity, IdentityError> {
        if profile.provider.trim().is_empty() || profile.subject.trim().is_empty() {
            return Err(IdentityError::Provider(
                "profile is missing provider or subject".to_string(),
            ));
        }

        let uid = profile.uid();
        let key = (tenant.as_str().to_string(), uid.clone());
        let mut external = self.external.write().await;
        let identity = external.entry(key).or_insert_with(|| {
            tracing::info!(uid = %uid, provider = %profile.provider, "external identity created");
            Identity {
                uid: uid.clone(),
                email: profile.email.as_ref().map(|e| e.trim().to_lowercase()),
                display_name: profile.display_name.clone(),
                provider: profile.provider.clone(),
            }
        });
        Ok(identity.clone())
    }
}
