//! Mapping of storage and identity failures into `QuireError`s.

use anyhow::Error;
use quire_auth::IdentityError;
use quire_blob::BlobError;
use quire_core::errors::QuireError;
use quire_core::ErrorKind;

pub const GENERIC_FAILURE: &str = "An unexpected error occurred. Please try again.";

pub fn blob_error(err: BlobError) -> Error {
    let quire = match &err {
        BlobError::NotFound { .. } => QuireError::not_found("File not found."),
        BlobError::Invalid { message } => QuireError::bad_request(message.clone()),
        BlobError::TooLarge { max, .. } => {
            QuireError::bad_request(format!("File exceeds the {max} byte limit."))
        }
        BlobError::Backend { .. } | BlobError::Io { .. } => {
            QuireError::bad_gateway("Storage is unavailable.")
        }
    };
    quire.with_source(err.into()).into_anyhow()
}

/// Provider codes with a fixed user-facing message; everything else is the
/// generic message.
pub fn identity_error(err: IdentityError) -> Error {
    let quire = match &err {
        IdentityError::WeakPassword { min } => QuireError::bad_request(format!(
            "Password must be at least {min} characters long."
        )),
        IdentityError::EmailAlreadyInUse => QuireError::conflict(
            "This email is already registered. Please use another email.",
        ),
        IdentityError::InvalidEmail => {
            QuireError::bad_request("Invalid email format. Please check your email.")
        }
        IdentityError::InvalidCredential => {
            QuireError::not_authenticated("Invalid email or password.")
        }
        IdentityError::Provider(_) | IdentityError::Internal(_) => {
            QuireError::general_error(GENERIC_FAILURE)
        }
    };
    let code = err.code();
    quire
        .with_data(serde_json::json!({ "code": code }))
        .with_source(err.into())
        .into_anyhow()
}

/// Kind of the structured error in `err`, if any.
pub fn kind(err: &Error) -> Option<ErrorKind> {
    QuireError::kind_of(err)
}

/// Replace the message of a structured error of `kind`, keeping the
/// original as source. Other errors pass through.
pub fn remap(err: Error, kind: ErrorKind, message: &str) -> Error {
    if QuireError::kind_of(&err) == Some(kind) {
        QuireError::new(kind, message).with_source(err).into_anyhow()
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes_map_to_fixed_messages() {
        let err = identity_error(IdentityError::WeakPassword { min: 6 });
        let quire = QuireError::from_anyhow(&err).unwrap();
        assert_eq!(quire.kind, ErrorKind::BadRequest);
        assert_eq!(quire.message, "Password must be at least 6 characters long.");
        assert_eq!(quire.data.as_ref().unwrap()["code"], "auth/weak-password");

        let err = identity_error(IdentityError::Provider("popup closed".into()));
        let quire = QuireError::from_anyhow(&err).unwrap();
        assert_eq!(quire.kind, ErrorKind::GeneralError);
        assert_eq!(quire.message, GENERIC_FAILURE);
    }

    #[test]
    fn storage_failures_hide_backend_details() {
        let io = std::io::Error::other("disk on fire");
        let err = blob_error(BlobError::from(io));
        let quire = QuireError::from_anyhow(&err).unwrap();
        assert_eq!(quire.kind, ErrorKind::BadGateway);
        assert!(!quire.message.contains("fire"));
    }

    #[test]
    fn remap_only_touches_matching_kind() {
        let err = QuireError::conflict("Record already exists in usernames: ada").into_anyhow();
        let err = remap(err, ErrorKind::Conflict, "Username is already taken.");
        assert_eq!(
            QuireError::from_anyhow(&err).unwrap().message,
            "Username is already taken."
        );

        let err = QuireError::not_found("x").into_anyhow();
        let err = remap(err, ErrorKind::Conflict, "y");
        assert_eq!(QuireError::from_anyhow(&err).unwrap().message, "x");
    }
}
