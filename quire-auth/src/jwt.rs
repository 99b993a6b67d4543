// Session tokens.

use anyhow::Result;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use quire_core::errors::QuireError;
use quire_core::{TenantContext, Viewer};
use serde::{Deserialize, Serialize};

use crate::Identity;

#[derive(Clone, Debug)]
pub struct TokenOptions {
    pub secret: String,
    pub issuer: String,
    pub ttl_secs: i64,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "quire".to_string(),
            ttl_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    /// Tenant the session was opened in.
    pub tenant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn viewer(&self) -> Viewer {
        Viewer {
            uid: self.sub.clone(),
            display_name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Signs and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    options: TokenOptions,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.options.issuer)
            .field("ttl_secs", &self.options.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(options: TokenOptions) -> Result<Self> {
        if options.secret.trim().is_empty() {
            return Err(QuireError::general_error("JWT secret is not configured").into_anyhow());
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(options.secret.as_bytes()),
            decoding: DecodingKey::from_secret(options.secret.as_bytes()),
            options,
        })
    }

    pub fn issue(&self, tenant: &TenantContext, identity: &Identity) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: identity.uid.clone(),
            tenant: tenant.as_str().to_string(),
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            iss: self.options.issuer.clone(),
            iat: now,
            exp: now + self.options.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            QuireError::general_error("Could not sign session token")
                .with_source(anyhow::Error::new(e))
                .into_anyhow()
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.options.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let decoded = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| QuireError::not_authenticated(e.to_string()).into_anyhow())?;
        Ok(decoded.claims)
    }

    /// Verify `token` and require it to belong to `tenant`.
    pub fn verify_for(&self, tenant: &TenantContext, token: &str) -> Result<SessionClaims> {
        let claims = self.verify(token)?;
        if claims.tenant != tenant.as_str() {
            return Err(
                QuireError::not_authenticated("Session token belongs to another tenant").into_anyhow(),
            );
        }
        Ok(claims)
    }
}

/// Pull the token out of an `Authorization` header value.
/// Accepts the `Bearer` and `JWT` schemes; a bare value is taken as the token.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let hv = header.trim();
    if hv.is_empty() {
        return None;
    }

    // Match `<scheme> <token>`.
    if let Some((scheme, token)) = hv.split_once(' ') {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let allowed = ["Bearer", "JWT"]
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme.trim()));
        return allowed.then_some(token);
    }

    Some(hv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::ErrorKind;

    fn issuer(secret: &str, ttl_secs: i64) -> TokenIssuer {
        TokenIssuer::new(TokenOptions {
            secret: secret.to_string(),
            issuer: "quire-test".to_string(),
            ttl_secs,
        })
        .unwrap()
    }

    fn identity() -> Identity {
        Identity {
            uid: "u1".to_string(),
            email: Some("ann@example.com".to_string()),
            display_name: Some("Ann".to_string()),
            provider: "password".to_string(),
        }
    }

    #[test]
    fn issued_tokens_verify() {
        let tokens = issuer("s3cret", 60);
        let token = tokens.issue(&TenantContext::default(), &identity()).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.tenant, "default");
        assert_eq!(claims.viewer().display_name.as_deref(), Some("Ann"));
    }

    #[test]
    fn foreign_and_expired_tokens_fail() {
        let token = issuer("other", 60).issue(&TenantContext::default(), &identity()).unwrap();
        let err = issuer("s3cret", 60).verify(&token).unwrap_err();
        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::NotAuthenticated));

        let expired = issuer("s3cret", -120).issue(&TenantContext::default(), &identity()).unwrap();
        assert!(issuer("s3cret", 60).verify(&expired).is_err());
    }

    #[test]
    fn tokens_are_bound_to_their_tenant() {
        let tokens = issuer("s3cret", 60);
        let acme = TenantContext::new("acme");
        let token = tokens.issue(&acme, &identity()).unwrap();

        assert_eq!(tokens.verify_for(&acme, &token).unwrap().sub, "u1");
        let err = tokens
            .verify_for(&TenantContext::new("globex"), &token)
            .unwrap_err();
        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::NotAuthenticated));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(TokenIssuer::new(TokenOptions::default()).is_err());
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(extract_bearer_token("JWT abc"), Some("abc"));
        assert_eq!(extract_bearer_token("abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("  "), None);
    }
}
