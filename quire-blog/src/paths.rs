//! Object paths and composite document ids.

use anyhow::Result;
use chrono::{DateTime, Utc};
use quire_core::errors::QuireError;
use uuid::Uuid;

/// `images/{timestamp_ms}-{nonce}`. The nonce keeps two uploads in the same
/// millisecond apart.
pub fn inline_image_path(now: DateTime<Utc>) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!("images/{}-{}", now.timestamp_millis(), &nonce[..12])
}

/// `profileImages/{uid}/{filename}` with the file name reduced to its last
/// path component.
pub fn profile_image_path(uid: &str, filename: &str) -> Result<String> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(QuireError::bad_request("Invalid file name.").into_anyhow());
    }
    Ok(format!("profileImages/{uid}/{base}"))
}

/// `{followerId}_{followeeId}`
pub fn follow_edge_id(follower: &str, followee: &str) -> String {
    format!("{follower}_{followee}")
}

/// Key of a username claim. Handles are unique regardless of case.
pub fn username_key(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn inline_paths_differ_within_one_millisecond() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let a = inline_image_path(now);
        let b = inline_image_path(now);
        assert!(a.starts_with("images/1700000000123-"));
        assert_ne!(a, b);
    }

    #[test]
    fn profile_paths_keep_only_the_file_name() {
        assert_eq!(
            profile_image_path("u1", "C:\\pics\\me.png").unwrap(),
            "profileImages/u1/me.png"
        );
        assert_eq!(
            profile_image_path("u1", "../../etc/passwd").unwrap(),
            "profileImages/u1/passwd"
        );
        assert!(profile_image_path("u1", "dir/..").is_err());
        assert!(profile_image_path("u1", "  ").is_err());
    }

    #[test]
    fn ids_and_keys() {
        assert_eq!(follow_edge_id("a", "b"), "a_b");
        assert_eq!(username_key(" Ada.L "), "ada.l");
    }
}
