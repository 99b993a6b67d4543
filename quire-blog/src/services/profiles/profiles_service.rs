use std::sync::Arc;

use anyhow::Result;
use quire_core::errors::QuireError;
use quire_core::{ErrorKind, RequestContext, WriteBatch};
use serde_json::json;

use crate::errors::{blob_error, remap};
use crate::model::{from_doc, User, UsernameClaim, BLOGS, DRAFTS, USERNAMES, USERS};
use crate::paths::{profile_image_path, username_key};
use crate::services::posts::posts_service::list_by_author;
use crate::services::BlogState;

use super::profiles_shared::{
    OwnProfile, ProfileUpdate, PublicProfile, MISSING_UID, NO_USERNAME, USERNAME_TAKEN,
    USER_DOC_MISSING, USER_NOT_FOUND,
};

/// The signed-in user's own profile and public profile lookups.
pub struct ProfilesService {
    state: Arc<BlogState>,
}

impl ProfilesService {
    pub fn new(state: Arc<BlogState>) -> Self {
        Self { state }
    }

    async fn user(&self, ctx: &RequestContext, uid: &str) -> Result<Option<User>> {
        self.state
            .docs
            .get(&ctx.tenant, USERS, uid)
            .await?
            .map(from_doc)
            .transpose()
    }

    async fn claim(&self, ctx: &RequestContext, key: &str) -> Result<Option<UsernameClaim>> {
        self.state
            .docs
            .get(&ctx.tenant, USERNAMES, key)
            .await?
            .map(from_doc)
            .transpose()
    }

    /// The viewer's user record, posts and drafts.
    pub async fn load_own_profile(&self, ctx: &RequestContext) -> Result<OwnProfile> {
        let viewer = ctx.require_viewer()?;
        let user = self
            .user(ctx, &viewer.uid)
            .await?
            .ok_or_else(|| QuireError::not_found(USER_DOC_MISSING).into_anyhow())?;
        let posts = list_by_author(&self.state, ctx, BLOGS, &viewer.uid).await?;
        let drafts = list_by_author(&self.state, ctx, DRAFTS, &viewer.uid).await?;
        tracing::debug!(user_id = %viewer.uid, "own profile loaded");
        Ok(OwnProfile {
            user,
            posts,
            drafts,
        })
    }

    /// True when nobody holds `candidate`, or the viewer already does.
    ///
    /// Advisory only: the claim in [`ProfilesService::update_profile`] is
    /// what enforces uniqueness.
    pub async fn is_username_available(&self, ctx: &RequestContext, candidate: &str) -> Result<bool> {
        let key = username_key(candidate);
        if key.is_empty() {
            return Ok(false);
        }
        Ok(match self.claim(ctx, &key).await? {
            None => true,
            Some(claim) => ctx.viewer.as_ref().is_some_and(|v| v.uid == claim.uid),
        })
    }

    /// Save the viewer's profile. Fields absent from `input` keep their
    /// current values.
    ///
    /// A selected avatar is uploaded first. The username claim, release of
    /// the previous claim and the user patch then commit as one batch; a
    /// taken handle fails the batch with Conflict. The previous avatar is
    /// removed only after the commit succeeded.
    pub async fn update_profile(&self, ctx: &RequestContext, input: ProfileUpdate) -> Result<User> {
        let viewer = ctx.require_viewer()?;
        input.check()?;
        let current = self
            .user(ctx, &viewer.uid)
            .await?
            .ok_or_else(|| QuireError::not_found(USER_DOC_MISSING).into_anyhow())?;

        let blob_ctx = self.state.blob_ctx(ctx);
        let uploaded = match &input.profile_image {
            Some(avatar) => {
                let path = profile_image_path(&viewer.uid, &avatar.filename)?;
                let receipt = self
                    .state
                    .blobs
                    .put_data_url(&blob_ctx, &path, &avatar.data_url)
                    .await
                    .map_err(blob_error)?;
                Some(receipt)
            }
            None => None,
        };

        let mut updated = current.clone();
        if let Some(name) = &input.name {
            updated.name = name.trim().to_string();
        }
        if input.bio.is_some() {
            updated.bio = input.bio().map(str::to_string);
        }
        if input.username.is_some() {
            updated.username = input.handle().map(str::to_string);
        }
        let old_key = current.username.as_deref().map(username_key);
        let new_key = updated.username.as_deref().map(username_key);
        if let Some(receipt) = &uploaded {
            updated.profile_image = Some(receipt.url.clone());
        }

        let mut batch = WriteBatch::new();
        if new_key != old_key {
            if let Some(key) = &new_key {
                batch = batch.create(USERNAMES, key.clone(), json!({ "uid": viewer.uid }));
            }
            if let Some(key) = &old_key {
                batch = batch.delete(USERNAMES, key.clone());
            }
        }
        batch = batch.patch(
            USERS,
            viewer.uid.clone(),
            json!({
                "name": updated.name,
                "bio": updated.bio,
                "username": updated.username,
                "profileImage": updated.profile_image,
            }),
        );

        if let Err(err) = self.state.docs.commit(&ctx.tenant, batch).await {
            if let Some(receipt) = &uploaded {
                // Same file name as the current avatar: the upload replaced it in place.
                if current.profile_image.as_deref() != Some(receipt.url.as_str()) {
                    if let Err(cleanup) = self.state.blobs.delete_key(&receipt.key).await {
                        tracing::warn!(key = %receipt.key, error = %cleanup, "could not remove unused avatar");
                    }
                }
            }
            return Err(remap(err, ErrorKind::Conflict, USERNAME_TAKEN));
        }

        if let (Some(receipt), Some(old)) = (&uploaded, &current.profile_image) {
            if *old != receipt.url {
                if let Err(err) = self.state.blobs.delete_by_url(&blob_ctx, old).await {
                    tracing::warn!(url = %old, error = %err, "could not remove previous avatar");
                }
            }
        }

        tracing::info!(
            user_id = %viewer.uid,
            username = updated.username.as_deref().unwrap_or(""),
            avatar = uploaded.is_some(),
            "profile updated"
        );
        Ok(updated)
    }

    /// Public profile of the user holding `username`.
    pub async fn public_profile(&self, ctx: &RequestContext, username: &str) -> Result<PublicProfile> {
        let user = self.resolve_username(ctx, username).await?;
        let posts = list_by_author(&self.state, ctx, BLOGS, &user.uid).await?;
        Ok(PublicProfile {
            user: user.into(),
            posts,
        })
    }

    /// User record behind a handle claim.
    pub async fn resolve_username(&self, ctx: &RequestContext, username: &str) -> Result<User> {
        let key = username_key(username);
        if key.is_empty() {
            return Err(QuireError::bad_request(NO_USERNAME).into_anyhow());
        }
        let claim = self
            .claim(ctx, &key)
            .await?
            .ok_or_else(|| QuireError::not_found(USER_NOT_FOUND).into_anyhow())?;
        if claim.uid.is_empty() {
            return Err(QuireError::general_error(MISSING_UID).into_anyhow());
        }
        self.user(ctx, &claim.uid)
            .await?
            .ok_or_else(|| QuireError::not_found(USER_NOT_FOUND).into_anyhow())
    }
}
