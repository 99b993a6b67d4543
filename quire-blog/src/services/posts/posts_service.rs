use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use quire_core::errors::QuireError;
use quire_core::{ErrorKind, Filter, RequestContext, WriteBatch};
use uuid::Uuid;

use crate::errors::remap;
use crate::model::{from_doc, sort_newest_first, to_doc, Draft, Post, BLOGS, DRAFTS};
use crate::services::BlogState;

use super::externalize::{discard_uploads, externalize_images, Externalized};
use super::posts_shared::{
    ensure_owner, normalize_hashtags, DraftInput, PublishInput, DRAFT_NOT_FOUND, EMPTY_DRAFT,
    EMPTY_POST, NO_DRAFT_SELECTED, POST_NOT_FOUND,
};

/// Draft lifecycle and published posts.
pub struct PostsService {
    state: Arc<BlogState>,
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl PostsService {
    pub fn new(state: Arc<BlogState>) -> Self {
        Self { state }
    }

    async fn find_draft(&self, ctx: &RequestContext, id: &str) -> Result<Option<Draft>> {
        self.state
            .docs
            .get(&ctx.tenant, DRAFTS, id)
            .await?
            .map(from_doc)
            .transpose()
    }

    /// The viewer's draft `id`. NotFound when absent, Forbidden when it
    /// belongs to someone else.
    pub async fn load_draft(&self, ctx: &RequestContext, id: &str) -> Result<Draft> {
        let viewer = ctx.require_viewer()?;
        let draft = self
            .find_draft(ctx, id)
            .await?
            .ok_or_else(|| QuireError::not_found(DRAFT_NOT_FOUND).into_anyhow())?;
        ensure_owner(&draft, &viewer.uid)?;
        tracing::debug!(draft_id = %id, "draft loaded");
        Ok(draft)
    }

    /// Create a draft or overwrite the one named by `input.id`.
    ///
    /// Inline images are externalized before the write. New drafts use a
    /// conditional create and existing ones a patch, so a draft deleted or
    /// created concurrently fails the save instead of being clobbered.
    pub async fn save_draft(&self, ctx: &RequestContext, input: DraftInput) -> Result<Draft> {
        let viewer = ctx.require_viewer()?;
        if input.is_empty() {
            return Err(QuireError::unprocessable(EMPTY_DRAFT).into_anyhow());
        }

        let existing = match &input.id {
            Some(id) => self.find_draft(ctx, id).await?,
            None => None,
        };
        if let Some(draft) = &existing {
            ensure_owner(draft, &viewer.uid)?;
        }

        let Externalized { content, uploaded } = externalize_images(
            &self.state.blobs,
            &self.state.blob_ctx(ctx),
            &input.content,
        )
        .await?;

        let draft = Draft {
            id: input.id.clone().unwrap_or_else(new_id),
            title: input.title,
            content,
            hashtags: normalize_hashtags(&input.hashtags),
            user_id: viewer.uid.clone(),
            timestamp: Utc::now(),
        };
        let doc = to_doc(&draft)?;
        let batch = if existing.is_some() {
            WriteBatch::new().patch(DRAFTS, draft.id.clone(), doc)
        } else {
            WriteBatch::new().create(DRAFTS, draft.id.clone(), doc)
        };

        if let Err(err) = self.state.docs.commit(&ctx.tenant, batch).await {
            discard_uploads(&self.state.blobs, &uploaded).await;
            return Err(err);
        }

        tracing::info!(
            draft_id = %draft.id,
            user_id = %viewer.uid,
            updated = existing.is_some(),
            "draft saved"
        );
        Ok(draft)
    }

    /// Create a post from the editor contents and, when the editor was
    /// opened from a draft, delete that draft in the same batch.
    pub async fn publish(&self, ctx: &RequestContext, input: PublishInput) -> Result<Post> {
        let viewer = ctx.require_viewer()?;
        if input.is_empty() {
            return Err(QuireError::unprocessable(EMPTY_POST).into_anyhow());
        }

        if let Some(draft_id) = &input.draft_id {
            let draft = self
                .find_draft(ctx, draft_id)
                .await?
                .ok_or_else(|| QuireError::not_found(DRAFT_NOT_FOUND).into_anyhow())?;
            ensure_owner(&draft, &viewer.uid)?;
        }

        let Externalized { content, uploaded } = externalize_images(
            &self.state.blobs,
            &self.state.blob_ctx(ctx),
            &input.content,
        )
        .await?;

        let post = Post {
            id: new_id(),
            title: input.title,
            content,
            hashtags: normalize_hashtags(&input.hashtags),
            user_id: viewer.uid.clone(),
            timestamp: Utc::now(),
        };
        let mut batch = WriteBatch::new().create(BLOGS, post.id.clone(), to_doc(&post)?);
        if let Some(draft_id) = &input.draft_id {
            batch = batch.delete_existing(DRAFTS, draft_id.clone());
        }

        if let Err(err) = self.state.docs.commit(&ctx.tenant, batch).await {
            discard_uploads(&self.state.blobs, &uploaded).await;
            return Err(remap(err, ErrorKind::NotFound, DRAFT_NOT_FOUND));
        }

        tracing::info!(
            post_id = %post.id,
            draft_id = input.draft_id.as_deref().unwrap_or(""),
            user_id = %viewer.uid,
            "post published"
        );
        Ok(post)
    }

    pub async fn delete_draft(&self, ctx: &RequestContext, id: Option<&str>) -> Result<()> {
        let viewer = ctx.require_viewer()?;
        let Some(id) = id else {
            return Err(QuireError::bad_request(NO_DRAFT_SELECTED).into_anyhow());
        };
        let draft = self
            .find_draft(ctx, id)
            .await?
            .ok_or_else(|| QuireError::not_found(DRAFT_NOT_FOUND).into_anyhow())?;
        ensure_owner(&draft, &viewer.uid)?;

        self.state
            .docs
            .commit(&ctx.tenant, WriteBatch::new().delete_existing(DRAFTS, id))
            .await
            .map_err(|err| remap(err, ErrorKind::NotFound, DRAFT_NOT_FOUND))?;

        tracing::info!(draft_id = %id, user_id = %viewer.uid, "draft deleted");
        Ok(())
    }

    /// The viewer's drafts, newest first.
    pub async fn list_drafts(&self, ctx: &RequestContext) -> Result<Vec<Draft>> {
        let viewer = ctx.require_viewer()?;
        list_by_author(&self.state, ctx, DRAFTS, &viewer.uid).await
    }

    /// Posts by `user_id`, newest first.
    pub async fn list_posts(&self, ctx: &RequestContext, user_id: &str) -> Result<Vec<Post>> {
        list_by_author(&self.state, ctx, BLOGS, user_id).await
    }

    pub async fn get_post(&self, ctx: &RequestContext, id: &str) -> Result<Post> {
        let doc = self
            .state
            .docs
            .get(&ctx.tenant, BLOGS, id)
            .await?
            .ok_or_else(|| QuireError::not_found(POST_NOT_FOUND).into_anyhow())?;
        from_doc(doc)
    }
}

/// Records of `collection` written by `user_id`, newest first.
pub(crate) async fn list_by_author(
    state: &BlogState,
    ctx: &RequestContext,
    collection: &str,
    user_id: &str,
) -> Result<Vec<Post>> {
    let docs = state
        .docs
        .find(&ctx.tenant, collection, &Filter::eq("userId", user_id))
        .await?;
    let mut posts = docs.into_iter().map(from_doc).collect::<Result<Vec<Post>>>()?;
    sort_newest_first(&mut posts);
    tracing::debug!(collection, user_id, count = posts.len(), "listed posts");
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use quire_core::{ErrorKind, Viewer};

    use super::*;
    use crate::test_support::{blog_state, viewer_ctx};

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn draft(title: &str) -> DraftInput {
        DraftInput {
            title: title.to_string(),
            ..DraftInput::default()
        }
    }

    #[tokio::test]
    async fn empty_draft_is_rejected_without_a_record() {
        let state = blog_state();
        let posts = PostsService::new(state.clone());
        let ctx = viewer_ctx("u1");

        let err = posts.save_draft(&ctx, DraftInput::default()).await.unwrap_err();

        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::Unprocessable));
        assert!(posts.list_drafts(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_tags_alone_do_not_make_a_draft() {
        let posts = PostsService::new(blog_state());
        let ctx = viewer_ctx("u1");
        let input = DraftInput {
            hashtags: vec!["#".into(), "  ".into()],
            ..DraftInput::default()
        };

        let err = posts.save_draft(&ctx, input).await.unwrap_err();
        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::Unprocessable));
        assert!(posts.list_drafts(&ctx).await.unwrap().is_empty());

        let err = posts
            .publish(
                &ctx,
                PublishInput {
                    hashtags: vec!["#".into()],
                    ..PublishInput::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::Unprocessable));
        assert!(posts.list_posts(&ctx, "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_overwrite_keeps_one_draft() {
        let posts = PostsService::new(blog_state());
        let ctx = viewer_ctx("u1");

        let first = posts.save_draft(&ctx, draft("v1")).await.unwrap();
        let second = posts
            .save_draft(
                &ctx,
                DraftInput {
                    id: Some(first.id.clone()),
                    hashtags: vec!["rust".into()],
                    ..draft("v2")
                },
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let drafts = posts.list_drafts(&ctx).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "v2");
        assert_eq!(drafts[0].hashtags, vec!["#rust"]);
    }

    #[tokio::test]
    async fn drafts_are_owner_only() {
        let posts = PostsService::new(blog_state());
        let owner = viewer_ctx("u1");
        let other = viewer_ctx("u2");
        let saved = posts.save_draft(&owner, draft("mine")).await.unwrap();

        let load = posts.load_draft(&other, &saved.id).await.unwrap_err();
        assert_eq!(QuireError::kind_of(&load), Some(ErrorKind::Forbidden));

        let overwrite = posts
            .save_draft(
                &other,
                DraftInput {
                    id: Some(saved.id.clone()),
                    ..draft("theirs")
                },
            )
            .await
            .unwrap_err();
        assert_eq!(QuireError::kind_of(&overwrite), Some(ErrorKind::Forbidden));

        let delete = posts.delete_draft(&other, Some(&saved.id)).await.unwrap_err();
        assert_eq!(QuireError::kind_of(&delete), Some(ErrorKind::Forbidden));
        assert_eq!(posts.load_draft(&owner, &saved.id).await.unwrap().title, "mine");
    }

    #[tokio::test]
    async fn publishing_a_draft_leaves_one_post_and_no_draft() {
        let posts = PostsService::new(blog_state());
        let ctx = viewer_ctx("u1");
        let saved = posts
            .save_draft(
                &ctx,
                DraftInput {
                    content: format!(r#"<p>x</p><img src="{PNG}">"#),
                    ..draft("hello")
                },
            )
            .await
            .unwrap();
        assert!(!saved.content.contains("data:"));

        let post = posts
            .publish(
                &ctx,
                PublishInput {
                    draft_id: Some(saved.id.clone()),
                    title: saved.title.clone(),
                    content: saved.content.clone(),
                    hashtags: vec![],
                },
            )
            .await
            .unwrap();

        assert_eq!(posts.list_posts(&ctx, "u1").await.unwrap(), vec![post.clone()]);
        assert!(posts.list_drafts(&ctx).await.unwrap().is_empty());
        let err = posts.load_draft(&ctx, &saved.id).await.unwrap_err();
        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::NotFound));
        assert_eq!(posts.get_post(&ctx, &post.id).await.unwrap(), post);
    }

    #[tokio::test]
    async fn publishing_a_missing_draft_creates_no_post() {
        let posts = PostsService::new(blog_state());
        let ctx = viewer_ctx("u1");

        let err = posts
            .publish(
                &ctx,
                PublishInput {
                    draft_id: Some("gone".into()),
                    title: "t".into(),
                    ..PublishInput::default()
                },
            )
            .await
            .unwrap_err();

        let quire = QuireError::from_anyhow(&err).unwrap();
        assert_eq!(quire.kind, ErrorKind::NotFound);
        assert_eq!(quire.message, DRAFT_NOT_FOUND);
        assert!(posts.list_posts(&ctx, "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_requires_a_draft_id_and_a_viewer() {
        let posts = PostsService::new(blog_state());

        let err = posts.delete_draft(&viewer_ctx("u1"), None).await.unwrap_err();
        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::BadRequest));

        let anonymous = RequestContext::new(Default::default());
        let err = posts.save_draft(&anonymous, draft("x")).await.unwrap_err();
        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::NotAuthenticated));
    }

    #[tokio::test]
    async fn posts_list_newest_first() {
        let posts = PostsService::new(blog_state());
        let ctx = RequestContext::new(Default::default()).with_viewer(Viewer::new("u1"));
        for title in ["a", "b"] {
            posts
                .publish(
                    &ctx,
                    PublishInput {
                        title: title.into(),
                        ..PublishInput::default()
                    },
                )
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let titles: Vec<String> = posts
            .list_posts(&ctx, "u1")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["b", "a"]);
    }
}
