use anyhow::Result;
use parking_lot::Mutex;
use quire_core::errors::QuireError;
use quire_core::ErrorKind;

use crate::model::User;
use crate::services::profiles::{AvatarUpload, OwnProfile, ProfileUpdate};
use crate::services::profiles::profiles_shared::USERNAME_TAKEN;

use super::{detail, user_message, BannerSlot, InFlight, PageContext, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileMode {
    #[default]
    Read,
    Edit,
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub bio: String,
    pub username: String,
}

impl ProfileForm {
    fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            bio: user.bio.clone().unwrap_or_default(),
            username: user.username.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default)]
struct ProfileView {
    mode: ProfileMode,
    loaded: Option<OwnProfile>,
    form: ProfileForm,
    /// Last loaded or saved values; cancel restores them.
    snapshot: ProfileForm,
    selected_image: Option<AvatarUpload>,
}

/// The signed-in user's own profile: read view and edit form.
pub struct ProfilePage {
    ctx: PageContext,
    view: Mutex<ProfileView>,
    banner: BannerSlot,
    flights: InFlight,
}

impl ProfilePage {
    pub fn new(ctx: PageContext) -> Self {
        let clear_after = ctx.services.state.settings.banner_clear_after;
        Self {
            ctx,
            view: Mutex::new(ProfileView::default()),
            banner: BannerSlot::new(clear_after),
            flights: InFlight::new(),
        }
    }

    pub fn banner(&self) -> &BannerSlot {
        &self.banner
    }

    pub fn mode(&self) -> ProfileMode {
        self.view.lock().mode
    }

    pub fn form(&self) -> ProfileForm {
        self.view.lock().form.clone()
    }

    pub fn profile(&self) -> Option<OwnProfile> {
        self.view.lock().loaded.clone()
    }

    pub fn selected_image(&self) -> Option<AvatarUpload> {
        self.view.lock().selected_image.clone()
    }

    pub async fn load(&self) -> Result<OwnProfile> {
        match self.ctx.services.profiles.load_own_profile(&self.ctx.request).await {
            Ok(profile) => {
                let mut view = self.view.lock();
                view.form = ProfileForm::from_user(&profile.user);
                view.snapshot = view.form.clone();
                view.loaded = Some(profile.clone());
                Ok(profile)
            }
            Err(err) => {
                let message = user_message(&err)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Failed to fetch data: {}", detail(&err)));
                self.banner.show(message, Severity::Error);
                Err(err)
            }
        }
    }

    pub fn begin_edit(&self) {
        self.view.lock().mode = ProfileMode::Edit;
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.view.lock().form.name = name.into();
    }

    pub fn set_bio(&self, bio: impl Into<String>) {
        self.view.lock().form.bio = bio.into();
    }

    pub fn set_username(&self, username: impl Into<String>) {
        self.view.lock().form.username = username.into();
    }

    pub fn select_image(&self, image: AvatarUpload) {
        self.view.lock().selected_image = Some(image);
    }

    /// Live check of the handle in the form.
    pub async fn check_username(&self) -> Result<bool> {
        let candidate = self.form().username;
        if candidate.trim().is_empty() {
            return Ok(true);
        }
        let available = self
            .ctx
            .services
            .profiles
            .is_username_available(&self.ctx.request, &candidate)
            .await?;
        if available {
            self.banner.clear();
        } else {
            self.banner.flash(USERNAME_TAKEN, Severity::Error);
        }
        Ok(available)
    }

    /// Restore the last loaded values and drop any selected image.
    pub fn cancel(&self) {
        let mut view = self.view.lock();
        view.form = view.snapshot.clone();
        view.selected_image = None;
        view.mode = ProfileMode::Read;
    }

    pub async fn save(&self) -> Result<User> {
        let _flight = self.flights.begin("save_profile")?;
        let (form, image) = {
            let view = self.view.lock();
            (view.form.clone(), view.selected_image.clone())
        };
        let input = ProfileUpdate {
            name: Some(form.name),
            bio: Some(form.bio),
            username: Some(form.username),
            profile_image: image,
        };

        match self.ctx.services.profiles.update_profile(&self.ctx.request, input).await {
            Ok(user) => {
                let mut view = self.view.lock();
                view.form = ProfileForm::from_user(&user);
                view.snapshot = view.form.clone();
                view.selected_image = None;
                view.mode = ProfileMode::Read;
                if let Some(loaded) = view.loaded.as_mut() {
                    loaded.user = user.clone();
                }
                drop(view);
                self.banner.clear();
                Ok(user)
            }
            Err(err) => {
                if QuireError::kind_of(&err) == Some(ErrorKind::Conflict) {
                    self.banner.flash(USERNAME_TAKEN, Severity::Error);
                } else {
                    let message = user_message(&err)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Failed to update profile: {}", detail(&err)));
                    self.banner.show(message, Severity::Error);
                }
                Err(err)
            }
        }
    }
}
