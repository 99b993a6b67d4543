use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use futures::future::try_join_all;
use quire_core::errors::QuireError;
use quire_core::{ErrorKind, Filter, RequestContext, WriteBatch};

use crate::errors::remap;
use crate::model::{
    from_doc, to_doc, FollowEdge, User, FOLLOWERS_COUNT, FOLLOWING_COUNT, FOLLOWS, USERS,
};
use crate::paths::follow_edge_id;
use crate::services::BlogState;

pub const ALREADY_FOLLOWING: &str = "You are already following this user.";
pub const NOT_FOLLOWING: &str = "You are not following this user.";
pub const SELF_FOLLOW: &str = "You cannot follow yourself.";

/// Follow edges and the denormalized counters on both users.
///
/// The edge and both counter updates always travel in one batch, so the
/// counters cannot drift from the edges.
pub struct FollowsService {
    state: Arc<BlogState>,
}

impl FollowsService {
    pub fn new(state: Arc<BlogState>) -> Self {
        Self { state }
    }

    pub async fn follow(&self, ctx: &RequestContext, followee: &str) -> Result<()> {
        let viewer = ctx.require_viewer()?;
        if viewer.uid == followee {
            return Err(QuireError::bad_request(SELF_FOLLOW).into_anyhow());
        }

        let edge = FollowEdge {
            follower_id: viewer.uid.clone(),
            followee_id: followee.to_string(),
            timestamp: Utc::now(),
        };
        let batch = WriteBatch::new()
            .create(FOLLOWS, follow_edge_id(&viewer.uid, followee), to_doc(&edge)?)
            .increment(USERS, viewer.uid.clone(), FOLLOWING_COUNT, 1)
            .increment(USERS, followee, FOLLOWERS_COUNT, 1);

        self.state
            .docs
            .commit(&ctx.tenant, batch)
            .await
            .map_err(|err| remap(err, ErrorKind::Conflict, ALREADY_FOLLOWING))
            .map_err(|err| remap(err, ErrorKind::NotFound, "User not found."))?;

        tracing::info!(user_id = %viewer.uid, %followee, "followed");
        Ok(())
    }

    pub async fn unfollow(&self, ctx: &RequestContext, followee: &str) -> Result<()> {
        let viewer = ctx.require_viewer()?;
        let batch = WriteBatch::new()
            .delete_existing(FOLLOWS, follow_edge_id(&viewer.uid, followee))
            .increment(USERS, viewer.uid.clone(), FOLLOWING_COUNT, -1)
            .increment(USERS, followee, FOLLOWERS_COUNT, -1);

        self.state
            .docs
            .commit(&ctx.tenant, batch)
            .await
            .map_err(|err| remap(err, ErrorKind::NotFound, NOT_FOLLOWING))?;

        tracing::info!(user_id = %viewer.uid, %followee, "unfollowed");
        Ok(())
    }

    /// Whether the viewer follows `followee`. Anonymous viewers follow no one.
    pub async fn is_following(&self, ctx: &RequestContext, followee: &str) -> Result<bool> {
        let Some(viewer) = &ctx.viewer else {
            return Ok(false);
        };
        let edge = self
            .state
            .docs
            .get(&ctx.tenant, FOLLOWS, &follow_edge_id(&viewer.uid, followee))
            .await?;
        Ok(edge.is_some())
    }

    /// Users following `uid`.
    pub async fn followers(&self, ctx: &RequestContext, uid: &str) -> Result<Vec<User>> {
        self.related_users(ctx, "followeeId", uid, |edge| edge.follower_id)
            .await
    }

    /// Users `uid` follows.
    pub async fn following(&self, ctx: &RequestContext, uid: &str) -> Result<Vec<User>> {
        self.related_users(ctx, "followerId", uid, |edge| edge.followee_id)
            .await
    }

    async fn related_users<F>(&self, ctx: &RequestContext, field: &str, uid: &str, other: F) -> Result<Vec<User>>
    where
        F: Fn(FollowEdge) -> String,
    {
        let docs = self
            .state
            .docs
            .find(&ctx.tenant, FOLLOWS, &Filter::eq(field, uid))
            .await?;
        let mut edges = docs
            .into_iter()
            .map(from_doc::<FollowEdge>)
            .collect::<Result<Vec<_>>>()?;
        edges.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let ids: Vec<String> = edges.into_iter().map(other).collect();
        let docs = try_join_all(
            ids.iter()
                .map(|id| self.state.docs.get(&ctx.tenant, USERS, id)),
        )
        .await?;
        // Edges whose user record is gone are skipped.
        docs.into_iter().flatten().map(from_doc).collect()
    }
}

#[cfg(test)]
mod tests {
    use quire_core::TenantContext;

    use super::*;
    use crate::test_support::{anonymous_ctx, blog_state, seed_user, viewer_ctx};

    async fn counts(state: &BlogState, uid: &str) -> (i64, i64) {
        let doc = state
            .docs
            .get(&TenantContext::default(), USERS, uid)
            .await
            .unwrap()
            .unwrap();
        let user: User = from_doc(doc).unwrap();
        (user.followers_count, user.following_count)
    }

    #[tokio::test]
    async fn follow_then_unfollow_restores_counters_and_removes_edge() {
        let state = blog_state();
        seed_user(&state, "a", None).await;
        seed_user(&state, "b", None).await;
        let follows = FollowsService::new(state.clone());
        let ctx = viewer_ctx("a");

        follows.follow(&ctx, "b").await.unwrap();
        assert!(follows.is_following(&ctx, "b").await.unwrap());
        assert_eq!(counts(&state, "a").await, (0, 1));
        assert_eq!(counts(&state, "b").await, (1, 0));
        assert_eq!(follows.followers(&ctx, "b").await.unwrap()[0].uid, "a");
        assert_eq!(follows.following(&ctx, "a").await.unwrap()[0].uid, "b");

        follows.unfollow(&ctx, "b").await.unwrap();
        assert!(!follows.is_following(&ctx, "b").await.unwrap());
        assert_eq!(counts(&state, "a").await, (0, 0));
        assert_eq!(counts(&state, "b").await, (0, 0));
        assert!(follows.followers(&ctx, "b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn double_follow_is_a_conflict_and_counts_once() {
        let state = blog_state();
        seed_user(&state, "a", None).await;
        seed_user(&state, "b", None).await;
        let follows = FollowsService::new(state.clone());
        let ctx = viewer_ctx("a");

        follows.follow(&ctx, "b").await.unwrap();
        let err = follows.follow(&ctx, "b").await.unwrap_err();

        let quire = QuireError::from_anyhow(&err).unwrap();
        assert_eq!(quire.kind, ErrorKind::Conflict);
        assert_eq!(quire.message, ALREADY_FOLLOWING);
        assert_eq!(counts(&state, "b").await, (1, 0));
    }

    #[tokio::test]
    async fn following_a_missing_user_changes_nothing() {
        let state = blog_state();
        seed_user(&state, "a", None).await;
        let follows = FollowsService::new(state.clone());
        let ctx = viewer_ctx("a");

        let err = follows.follow(&ctx, "ghost").await.unwrap_err();

        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::NotFound));
        assert!(!follows.is_following(&ctx, "ghost").await.unwrap());
        assert_eq!(counts(&state, "a").await, (0, 0));
    }

    #[tokio::test]
    async fn unfollow_without_edge_and_self_follow_are_rejected() {
        let state = blog_state();
        seed_user(&state, "a", None).await;
        seed_user(&state, "b", None).await;
        let follows = FollowsService::new(state.clone());
        let ctx = viewer_ctx("a");

        let err = follows.unfollow(&ctx, "b").await.unwrap_err();
        assert_eq!(QuireError::from_anyhow(&err).unwrap().message, NOT_FOLLOWING);
        assert_eq!(counts(&state, "b").await, (0, 0));

        let err = follows.follow(&ctx, "a").await.unwrap_err();
        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::BadRequest));
    }

    #[tokio::test]
    async fn anonymous_viewers_follow_no_one() {
        let follows = FollowsService::new(blog_state());
        assert!(!follows.is_following(&anonymous_ctx(), "b").await.unwrap());
        let err = follows.follow(&anonymous_ctx(), "b").await.unwrap_err();
        assert_eq!(QuireError::kind_of(&err), Some(ErrorKind::NotAuthenticated));
    }
}
