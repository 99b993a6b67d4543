use thiserror::Error;

/// Failures reported by an identity provider.
///
/// Each variant has a stable string code so front ends can branch on it
/// without matching on messages.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("email address is already in use")]
    EmailAlreadyInUse,

    #[error("email address is badly formatted")]
    InvalidEmail,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("internal identity error: {0}")]
    Internal(String),
}

impl IdentityError {
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::WeakPassword { .. } => "auth/weak-password",
            IdentityError::EmailAlreadyInUse => "auth/email-already-in-use",
            IdentityError::InvalidEmail => "auth/invalid-email",
            IdentityError::InvalidCredential => "auth/invalid-credential",
            IdentityError::Provider(_) => "auth/provider-error",
            IdentityError::Internal(_) => "auth/internal-error",
        }
    }
}

impl From<bcrypt::BcryptError> for IdentityError {
    fn from(err: bcrypt::BcryptError) -> Self {
        IdentityError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(IdentityError::WeakPassword { min: 6 }.code(), "auth/weak-password");
        assert_eq!(IdentityError::EmailAlreadyInUse.code(), "auth/email-already-in-use");
        assert_eq!(IdentityError::InvalidEmail.code(), "auth/invalid-email");
        assert_eq!(IdentityError::Provider("x".into()).code(), "auth/provider-error");
    }
}
