use anyhow::Result;
use parking_lot::Mutex;

use crate::services::profiles::PublicProfile;

use super::{detail, user_message, BannerSlot, InFlight, PageContext, Severity};

pub const LOGIN_REDIRECT: &str = "/login";

/// Relationship between the viewer and the profile owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowState {
    /// Profile or relation not resolved yet.
    #[default]
    Unknown,
    NotFollowing,
    Following,
    /// Following, with the unfollow confirmation showing.
    ConfirmUnfollow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowAction {
    Followed,
    LoginRequired { redirect: &'static str },
    ConfirmRequested,
    Unfollowed,
    Cancelled,
    /// The action does not apply in the current state.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileStats {
    pub posts: usize,
    pub followers: i64,
    pub following: i64,
}

#[derive(Debug, Default)]
struct PublicView {
    state: FollowState,
    profile: Option<PublicProfile>,
}

/// Another user's profile with the follow/unfollow controls.
pub struct PublicProfilePage {
    ctx: PageContext,
    view: Mutex<PublicView>,
    banner: BannerSlot,
    flights: InFlight,
}

impl PublicProfilePage {
    pub fn new(ctx: PageContext) -> Self {
        let clear_after = ctx.services.state.settings.banner_clear_after;
        Self {
            ctx,
            view: Mutex::new(PublicView::default()),
            banner: BannerSlot::new(clear_after),
            flights: InFlight::new(),
        }
    }

    pub fn banner(&self) -> &BannerSlot {
        &self.banner
    }

    pub fn state(&self) -> FollowState {
        self.view.lock().state
    }

    pub fn profile(&self) -> Option<PublicProfile> {
        self.view.lock().profile.clone()
    }

    pub fn stats(&self) -> ProfileStats {
        self.view
            .lock()
            .profile
            .as_ref()
            .map(|p| ProfileStats {
                posts: p.post_count(),
                followers: p.user.followers_count,
                following: p.user.following_count,
            })
            .unwrap_or_default()
    }

    fn owner_uid(&self) -> Option<String> {
        self.view.lock().profile.as_ref().map(|p| p.user.uid.clone())
    }

    /// Resolve the profile and whether the viewer follows its owner.
    pub async fn load(&self, username: &str) -> Result<PublicProfile> {
        *self.view.lock() = PublicView::default();
        let services = &self.ctx.services;
        let loaded = async {
            let profile = services
                .profiles
                .public_profile(&self.ctx.request, username)
                .await?;
            let following = services
                .follows
                .is_following(&self.ctx.request, &profile.user.uid)
                .await?;
            anyhow::Ok((profile, following))
        }
        .await;

        match loaded {
            Ok((profile, following)) => {
                let mut view = self.view.lock();
                view.state = if following {
                    FollowState::Following
                } else {
                    FollowState::NotFollowing
                };
                view.profile = Some(profile.clone());
                Ok(profile)
            }
            Err(err) => {
                let message = user_message(&err)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Error: {}", detail(&err)));
                self.banner.show(message, Severity::Error);
                Err(err)
            }
        }
    }

    pub async fn follow(&self) -> Result<FollowAction> {
        if !self.ctx.request.is_authenticated() {
            return Ok(FollowAction::LoginRequired {
                redirect: LOGIN_REDIRECT,
            });
        }
        let Some(uid) = self.owner_uid() else {
            return Ok(FollowAction::Ignored);
        };
        if self.state() != FollowState::NotFollowing {
            return Ok(FollowAction::Ignored);
        }
        let _flight = self.flights.begin("follow")?;

        match self.ctx.services.follows.follow(&self.ctx.request, &uid).await {
            Ok(()) => {
                let mut view = self.view.lock();
                view.state = FollowState::Following;
                if let Some(profile) = view.profile.as_mut() {
                    profile.user.followers_count += 1;
                }
                Ok(FollowAction::Followed)
            }
            Err(err) => {
                self.banner
                    .show(format!("Error following user: {}", detail(&err)), Severity::Error);
                Err(err)
            }
        }
    }

    /// First step of unfollowing: ask for confirmation.
    pub fn request_unfollow(&self) -> FollowAction {
        let mut view = self.view.lock();
        if view.state != FollowState::Following {
            return FollowAction::Ignored;
        }
        view.state = FollowState::ConfirmUnfollow;
        FollowAction::ConfirmRequested
    }

    pub fn cancel_unfollow(&self) -> FollowAction {
        let mut view = self.view.lock();
        if view.state != FollowState::ConfirmUnfollow {
            return FollowAction::Ignored;
        }
        view.state = FollowState::Following;
        FollowAction::Cancelled
    }

    pub async fn confirm_unfollow(&self) -> Result<FollowAction> {
        if self.state() != FollowState::ConfirmUnfollow {
            return Ok(FollowAction::Ignored);
        }
        let Some(uid) = self.owner_uid() else {
            return Ok(FollowAction::Ignored);
        };
        let _flight = self.flights.begin("unfollow")?;

        match self.ctx.services.follows.unfollow(&self.ctx.request, &uid).await {
            Ok(()) => {
                let mut view = self.view.lock();
                view.state = FollowState::NotFollowing;
                if let Some(profile) = view.profile.as_mut() {
                    profile.user.followers_count -= 1;
                }
                Ok(FollowAction::Unfollowed)
            }
            Err(err) => {
                self.view.lock().state = FollowState::Following;
                self.banner
                    .show(format!("Error unfollowing user: {}", detail(&err)), Severity::Error);
                Err(err)
            }
        }
    }
}
