//! Tag list edited alongside a draft.
//!
//! Tags are kept bare (`rust`) while editing and stored with a leading `#`
//! (`#rust`).

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hashtags {
    tags: Vec<String>,
}

fn bare(tag: &str) -> &str {
    tag.trim().trim_start_matches('#')
}

impl Hashtags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags as stored on a record; the first leading `#` of each is removed.
    pub fn from_stored(stored: &[String]) -> Self {
        let mut tags = Self::new();
        for tag in stored {
            let tag = tag.strip_prefix('#').unwrap_or(tag);
            tags.add(tag);
        }
        tags
    }

    /// Returns false when the input is empty or already present.
    pub fn add(&mut self, input: &str) -> bool {
        let tag = bare(input);
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let tag = bare(tag);
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Bare tags in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    pub fn to_stored(&self) -> Vec<String> {
        self.tags.iter().map(|t| format!("#{t}")).collect()
    }
}
