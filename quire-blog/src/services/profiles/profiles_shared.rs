use anyhow::Result;
use quire_core::errors::QuireError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use crate::model::{Draft, Post, PublicUser, User};
use crate::services::posts::externalize::is_supported_image;

pub const USERNAME_TAKEN: &str = "Username is already taken.";
pub const USER_DOC_MISSING: &str = "User document does not exist.";
pub const USER_NOT_FOUND: &str = "User not found.";
pub const NO_USERNAME: &str = "No username parameter provided.";
pub const MISSING_UID: &str = "User data is missing UID.";
pub const INVALID_PROFILE: &str = "Please check the highlighted profile fields.";

/// A newly selected avatar, sent as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUpload {
    pub filename: String,
    pub data_url: String,
}

/// Editable profile fields. An absent field is left unchanged; a blank
/// `username` or `bio` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    #[validate(length(max = 80))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[serde(default)]
    #[validate(length(min = 3, max = 30))]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_image: Option<AvatarUpload>,
}

impl ProfileUpdate {
    /// Trimmed handle; blank means none.
    pub fn handle(&self) -> Option<&str> {
        self.username.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn bio(&self) -> Option<&str> {
        self.bio.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Field rules: lengths plus the handle alphabet (letters, digits, `_`
    /// and `.`).
    pub fn check(&self) -> Result<()> {
        let mut fields = Map::new();
        let normalized = ProfileUpdate {
            username: self.handle().map(str::to_string),
            ..self.clone()
        };
        if let Err(errors) = normalized.validate() {
            collect_field_errors(&errors, &mut fields);
        }
        if let Some(handle) = self.handle() {
            if !is_handle(handle) {
                fields.insert(
                    "username".to_string(),
                    Value::from(vec!["letters, digits, '_' and '.' only"]),
                );
            }
        }
        if let Some(avatar) = &self.profile_image {
            if !is_supported_image(&avatar.data_url) {
                fields.insert(
                    "profileImage".to_string(),
                    Value::from(vec!["must be a PNG, JPEG, GIF or WebP image"]),
                );
            }
        }
        if fields.is_empty() {
            return Ok(());
        }
        Err(QuireError::unprocessable(INVALID_PROFILE)
            .with_errors(Value::Object(fields))
            .into_anyhow())
    }
}

fn is_handle(handle: &str) -> bool {
    handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn collect_field_errors(errors: &ValidationErrors, out: &mut Map<String, Value>) {
    for (field, errs) in errors.field_errors() {
        let codes: Vec<String> = errs.iter().map(|e| e.code.to_string()).collect();
        out.insert(field.to_string(), Value::from(codes));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnProfile {
    pub user: User,
    pub posts: Vec<Post>,
    pub drafts: Vec<Draft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub user: PublicUser,
    pub posts: Vec<Post>,
}

impl PublicProfile {
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(username: &str) -> ProfileUpdate {
        ProfileUpdate {
            name: Some("Ada".into()),
            username: Some(username.into()),
            ..ProfileUpdate::default()
        }
    }

    #[test]
    fn handles_are_checked_for_length_and_alphabet() {
        assert!(update("ada.l_99").check().is_ok());
        assert!(update("  ").check().is_ok());

        for bad in ["ab", "has space", "emoji✓ok", &"x".repeat(31)] {
            let err = update(bad).check().unwrap_err();
            let quire = QuireError::from_anyhow(&err).unwrap();
            assert_eq!(quire.kind, quire_core::ErrorKind::Unprocessable);
            assert!(quire.errors.as_ref().unwrap().get("username").is_some(), "{bad}");
        }
    }

    #[test]
    fn avatar_must_be_an_image() {
        let input = ProfileUpdate {
            profile_image: Some(AvatarUpload {
                filename: "a.txt".into(),
                data_url: "data:text/plain;base64,aGk=".into(),
            }),
            ..ProfileUpdate::default()
        };
        let err = input.check().unwrap_err();
        let quire = QuireError::from_anyhow(&err).unwrap();
        assert!(quire.errors.as_ref().unwrap().get("profileImage").is_some());

        let svg = ProfileUpdate {
            profile_image: Some(AvatarUpload {
                filename: "a.svg".into(),
                data_url: "data:image/svg+xml;base64,PHN2Zy8+".into(),
            }),
            ..ProfileUpdate::default()
        };
        assert!(svg.check().is_err());
    }

    #[test]
    fn absent_fields_are_not_checked() {
        assert!(ProfileUpdate::default().check().is_ok());
    }
}
