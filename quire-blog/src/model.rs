//! Records stored in the document store and their collection names.

use anyhow::Result;
use chrono::{DateTime, Utc};
use quire_core::errors::QuireError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const USERS: &str = "users";
pub const BLOGS: &str = "blogs";
pub const DRAFTS: &str = "drafts";
pub const FOLLOWS: &str = "follows";
/// Handle claims keyed by the lower-cased username.
pub const USERNAMES: &str = "usernames";

pub const FOLLOWERS_COUNT: &str = "followersCount";
pub const FOLLOWING_COUNT: &str = "followingCount";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub following_count: i64,
}

impl User {
    /// A freshly registered user with zeroed counters.
    pub fn seed(uid: impl Into<String>, name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            email,
            username: None,
            bio: None,
            profile_image: None,
            followers_count: 0,
            following_count: 0,
        }
    }
}

/// A user as other users see it: no email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub uid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            uid: user.uid,
            name: user.name,
            username: user.username,
            bio: user.bio,
            profile_image: user.profile_image,
            followers_count: user.followers_count,
            following_count: user.following_count,
        }
    }
}

/// A published post. Drafts share the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Each tag carries its leading `#`.
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

pub type Draft = Post;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub follower_id: String,
    pub followee_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameClaim {
    pub uid: String,
}

pub fn from_doc<T: DeserializeOwned>(doc: Value) -> Result<T> {
    serde_json::from_value(doc).map_err(|e| {
        QuireError::general_error("Stored record has an unexpected shape")
            .with_source(e.into())
            .into_anyhow()
    })
}

pub fn to_doc<T: Serialize>(record: &T) -> Result<Value> {
    Ok(serde_json::to_value(record)?)
}

/// Newest first.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
}
