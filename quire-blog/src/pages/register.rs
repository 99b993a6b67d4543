use anyhow::Result;
use parking_lot::Mutex;
use quire_auth::ExternalProfile;

use crate::errors::GENERIC_FAILURE;
use crate::services::accounts::{AuthSession, RegisterInput};

use super::{describe, BannerSlot, InFlight, PageContext, Severity};

pub const AFTER_REGISTER_REDIRECT: &str = "/complete_profile";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    fn is_complete(&self) -> bool {
        [&self.name, &self.email, &self.password]
            .iter()
            .all(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub session: AuthSession,
    pub redirect: &'static str,
}

/// Sign-up page: email/password registration or an external provider.
pub struct RegisterPage {
    ctx: PageContext,
    form: Mutex<RegisterForm>,
    banner: BannerSlot,
    flights: InFlight,
}

impl RegisterPage {
    pub fn new(ctx: PageContext) -> Self {
        let clear_after = ctx.services.state.settings.banner_clear_after;
        Self {
            ctx,
            form: Mutex::new(RegisterForm::default()),
            banner: BannerSlot::new(clear_after),
            flights: InFlight::new(),
        }
    }

    pub fn banner(&self) -> &BannerSlot {
        &self.banner
    }

    pub fn form(&self) -> RegisterForm {
        self.form.lock().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.flights.is_active("register")
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.form.lock().name = name.into();
    }

    pub fn set_email(&self, email: impl Into<String>) {
        self.form.lock().email = email.into();
    }

    pub fn set_password(&self, password: impl Into<String>) {
        self.form.lock().password = password.into();
    }

    /// Register with the form values. An incomplete form sends nothing and
    /// yields `Ok(None)`.
    pub async fn submit(&self) -> Result<Option<RegisterOutcome>> {
        let form = self.form();
        if !form.is_complete() {
            return Ok(None);
        }
        let _flight = self.flights.begin("register")?;
        let input = RegisterInput {
            name: form.name,
            email: form.email,
            password: form.password,
        };

        let registered = self
            .ctx
            .services
            .accounts
            .register_with_password(&self.ctx.request, input)
            .await;
        self.finish(registered).map(Some)
    }

    pub async fn sign_in_with_provider(&self, profile: ExternalProfile) -> Result<RegisterOutcome> {
        let _flight = self.flights.begin("register")?;
        let signed_in = self
            .ctx
            .services
            .accounts
            .sign_in_with_provider(&self.ctx.request, profile)
            .await;
        self.finish(signed_in)
    }

    fn finish(&self, result: Result<AuthSession>) -> Result<RegisterOutcome> {
        match result {
            Ok(session) => {
                self.banner.clear();
                *self.form.lock() = RegisterForm::default();
                Ok(RegisterOutcome {
                    session,
                    redirect: AFTER_REGISTER_REDIRECT,
                })
            }
            Err(err) => {
                self.banner.show(describe(&err, GENERIC_FAILURE), Severity::Error);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use quire_core::{DocumentStore, Filter};

    use super::*;
    use crate::model::USERS;
    use crate::services;
    use crate::test_support::{anonymous_ctx, blog_state};

    fn page() -> RegisterPage {
        RegisterPage::new(PageContext::new(services::configure(blog_state()), anonymous_ctx()))
    }

    #[tokio::test]
    async fn incomplete_form_sends_nothing() {
        let page = page();
        page.set_name("Ada");
        page.set_email("ada@example.com");

        assert!(page.submit().await.unwrap().is_none());
        assert!(page.banner().current().is_none());
    }

    #[tokio::test]
    async fn registration_redirects_to_complete_profile() {
        let page = page();
        page.set_name("Ada");
        page.set_email("ada@example.com");
        page.set_password("correct horse");

        let outcome = page.submit().await.unwrap().unwrap();

        assert_eq!(outcome.redirect, "/complete_profile");
        assert_eq!(outcome.session.user.name, "Ada");
        assert_eq!(outcome.session.user.followers_count, 0);
        assert_eq!(page.form(), RegisterForm::default());
    }

    #[tokio::test]
    async fn weak_password_is_reported_and_creates_no_user() {
        let page = page();
        page.set_name("Ada");
        page.set_email("ada@example.com");
        page.set_password("abc");

        page.submit().await.unwrap_err();

        assert_eq!(
            page.banner().message().as_deref(),
            Some("Password must be at least 6 characters long.")
        );
        let state = &page.ctx.services.state;
        let users = state
            .docs
            .find(&page.ctx.request.tenant, USERS, &Filter::default())
            .await
            .unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_keeps_the_form() {
        let page = page();
        for _ in 0..2 {
            page.set_name("Ada");
            page.set_email("ada@example.com");
            page.set_password("correct horse");
            let _ = page.submit().await;
        }

        assert_eq!(
            page.banner().message().as_deref(),
            Some("This email is already registered. Please use another email.")
        );
        assert_eq!(page.form().email, "ada@example.com");
    }

    #[tokio::test]
    async fn provider_sign_in_seeds_the_user() {
        let page = page();
        let profile = ExternalProfile {
            provider: "google".into(),
            subject: "123".into(),
            email: Some("ada@example.com".into()),
            display_name: Some("Ada".into()),
        };

        let outcome = page.sign_in_with_provider(profile).await.unwrap();

        assert_eq!(outcome.redirect, AFTER_REGISTER_REDIRECT);
        assert_eq!(outcome.session.user.uid, "google:123");
    }
}
