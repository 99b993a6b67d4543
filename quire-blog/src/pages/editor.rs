use anyhow::Result;
use parking_lot::Mutex;
use quire_core::errors::QuireError;
use quire_core::ErrorKind;

use crate::hashtags::Hashtags;
use crate::model::{Draft, Post};
use crate::services::posts::{DraftInput, PublishInput};

use super::{describe, BannerSlot, InFlight, PageContext, Severity};

const SAVE_FAILED: &str = "Failed to save draft. Please try again.";
const SUBMIT_FAILED: &str = "Failed to submit blog. Please try again.";
const DELETE_FAILED: &str = "Failed to delete draft. Please try again.";

pub const AFTER_DELETE_REDIRECT: &str = "/profile";

/// Fields of the editor form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pub draft_id: Option<String>,
    pub title: String,
    pub content: String,
    pub hashtags: Hashtags,
}

impl EditorState {
    fn from_draft(draft: Draft) -> Self {
        Self {
            hashtags: Hashtags::from_stored(&draft.hashtags),
            draft_id: Some(draft.id),
            title: draft.title,
            content: draft.content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No draft is loaded; nothing was sent.
    NothingLoaded,
    Deleted { redirect: &'static str },
}

/// The blog editor: compose a post, keep it as a draft, publish it.
pub struct EditorPage {
    ctx: PageContext,
    form: Mutex<EditorState>,
    banner: BannerSlot,
    flights: InFlight,
}

impl EditorPage {
    pub fn new(ctx: PageContext) -> Self {
        let clear_after = ctx.services.state.settings.banner_clear_after;
        Self {
            ctx,
            form: Mutex::new(EditorState::default()),
            banner: BannerSlot::new(clear_after),
            flights: InFlight::new(),
        }
    }

    /// Open the editor, loading `draft_id` when given. A missing draft
    /// leaves the editor empty.
    pub async fn open(&self, draft_id: Option<&str>) -> Result<()> {
        *self.form.lock() = EditorState::default();
        let Some(id) = draft_id else {
            return Ok(());
        };
        match self.ctx.services.posts.load_draft(&self.ctx.request, id).await {
            Ok(draft) => {
                *self.form.lock() = EditorState::from_draft(draft);
                Ok(())
            }
            Err(err) => {
                self.banner.show(describe(&err, "Draft not found."), Severity::Error);
                Err(err)
            }
        }
    }

    pub fn state(&self) -> EditorState {
        self.form.lock().clone()
    }

    pub fn banner(&self) -> &BannerSlot {
        &self.banner
    }

    pub fn is_saving_draft(&self) -> bool {
        self.flights.is_active("save_draft")
    }

    pub fn is_submitting(&self) -> bool {
        self.flights.is_active("publish")
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.form.lock().title = title.into();
    }

    pub fn set_content(&self, content: impl Into<String>) {
        self.form.lock().content = content.into();
    }

    pub fn add_hashtag(&self, input: &str) -> bool {
        self.form.lock().hashtags.add(input)
    }

    pub fn remove_hashtag(&self, tag: &str) -> bool {
        self.form.lock().hashtags.remove(tag)
    }

    pub async fn save_draft(&self) -> Result<Draft> {
        let _flight = self.flights.begin("save_draft")?;
        let form = self.state();
        let input = DraftInput {
            id: form.draft_id.clone(),
            title: form.title,
            content: form.content,
            hashtags: form.hashtags.to_stored(),
        };

        match self.ctx.services.posts.save_draft(&self.ctx.request, input).await {
            Ok(draft) => {
                let message = if form.draft_id.is_some() {
                    "Draft updated successfully!"
                } else {
                    "Draft saved successfully!"
                };
                self.banner.flash(message, Severity::Success);
                self.reset();
                Ok(draft)
            }
            Err(err) => {
                self.banner.flash(describe(&err, SAVE_FAILED), Severity::Error);
                Err(err)
            }
        }
    }

    pub async fn publish(&self) -> Result<Post> {
        let _flight = self.flights.begin("publish")?;
        let form = self.state();
        let input = PublishInput {
            draft_id: form.draft_id,
            title: form.title,
            content: form.content,
            hashtags: form.hashtags.to_stored(),
        };

        match self.ctx.services.posts.publish(&self.ctx.request, input).await {
            Ok(post) => {
                self.banner.flash("Blog submitted successfully!", Severity::Success);
                self.reset();
                Ok(post)
            }
            Err(err) => {
                self.banner.show(describe(&err, SUBMIT_FAILED), Severity::Error);
                Err(err)
            }
        }
    }

    pub async fn delete_draft(&self) -> Result<DeleteOutcome> {
        let Some(id) = self.form.lock().draft_id.clone() else {
            return Ok(DeleteOutcome::NothingLoaded);
        };
        let _flight = self.flights.begin("delete_draft")?;

        match self.ctx.services.posts.delete_draft(&self.ctx.request, Some(&id)).await {
            Ok(()) => {
                self.banner.flash("Draft deleted successfully!", Severity::Success);
                self.reset();
                Ok(DeleteOutcome::Deleted {
                    redirect: AFTER_DELETE_REDIRECT,
                })
            }
            Err(err) => {
                let message = match QuireError::kind_of(&err) {
                    Some(ErrorKind::Forbidden | ErrorKind::NotFound) => describe(&err, DELETE_FAILED),
                    _ => DELETE_FAILED.to_string(),
                };
                self.banner.flash(message, Severity::Error);
                Err(err)
            }
        }
    }

    fn reset(&self) {
        *self.form.lock() = EditorState::default();
    }
}
