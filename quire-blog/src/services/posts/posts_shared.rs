use anyhow::Result;
use quire_core::errors::QuireError;
use serde::{Deserialize, Serialize};

use crate::model::Post;

pub const DRAFT_NOT_FOUND: &str = "Draft not found.";
pub const POST_NOT_FOUND: &str = "Post not found.";
pub const EMPTY_DRAFT: &str = "Cannot save an empty draft.";
pub const EMPTY_POST: &str = "Cannot publish an empty post.";
pub const NO_DRAFT_SELECTED: &str = "No draft is loaded.";

/// Editor contents submitted for saving. `id` names the draft to
/// overwrite; `None` creates a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Stored form, each tag with its leading `#`.
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl DraftInput {
    /// Blank tags such as `"#"` do not count.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.content.trim().is_empty()
            && normalize_hashtags(&self.hashtags).is_empty()
    }
}

/// Editor contents submitted for publishing. `draft_id` is the draft the
/// editor was opened from, removed once the post exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishInput {
    #[serde(default)]
    pub draft_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl PublishInput {
    /// Tags alone never make a post.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }
}

pub fn ensure_owner(draft: &Post, uid: &str) -> Result<()> {
    if draft.user_id != uid {
        return Err(QuireError::forbidden("You can only change your own drafts.").into_anyhow());
    }
    Ok(())
}

/// Keep tags that carry a name; add the `#` where it is missing.
pub fn normalize_hashtags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let bare = tag.trim().trim_start_matches('#');
        if bare.is_empty() {
            continue;
        }
        let tag = format!("#{bare}");
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emptiness_counts_title_content_and_tags() {
        let mut input = DraftInput::default();
        assert!(input.is_empty());
        input.content = "  \n".into();
        assert!(input.is_empty());
        input.hashtags = vec!["#".into(), "  ".into()];
        assert!(input.is_empty());
        input.hashtags = vec!["#x".into()];
        assert!(!input.is_empty());
    }

    #[test]
    fn publish_emptiness_ignores_tags() {
        let input = PublishInput {
            hashtags: vec!["#rust".into()],
            ..PublishInput::default()
        };
        assert!(input.is_empty());
    }

    #[test]
    fn hashtags_are_prefixed_and_deduplicated() {
        let tags = vec!["rust".to_string(), "#rust".to_string(), " # ".to_string(), "#web".to_string()];
        assert_eq!(normalize_hashtags(&tags), vec!["#rust", "#web"]);
    }
}
