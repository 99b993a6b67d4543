//! Page controllers.
//!
//! Each page is built with an explicit [`PageContext`] and keeps its own
//! view state, a [`BannerSlot`] for user-facing messages and [`InFlight`]
//! flags. Workflow errors are caught here: the banner shows validation
//! and lookup messages verbatim and a per-action message otherwise, and the
//! error is still returned to the caller.

pub mod banner;
pub mod editor;
pub mod in_flight;
pub mod profile;
pub mod public_profile;
pub mod register;

use anyhow::Error;
use quire_core::errors::QuireError;
use quire_core::{ErrorKind, RequestContext};

use crate::services::BlogServices;

pub use banner::{Banner, BannerSlot, Severity};
pub use editor::{DeleteOutcome, EditorPage, EditorState};
pub use in_flight::{InFlight, InFlightGuard};
pub use profile::{ProfileForm, ProfileMode, ProfilePage};
pub use public_profile::{FollowAction, FollowState, ProfileStats, PublicProfilePage};
pub use register::{RegisterOutcome, RegisterPage};

/// Services plus the request the page acts for.
#[derive(Clone)]
pub struct PageContext {
    pub services: BlogServices,
    pub request: RequestContext,
}

impl PageContext {
    pub fn new(services: BlogServices, request: RequestContext) -> Self {
        Self { services, request }
    }
}

/// Message of a structured error meant for users, if `err` carries one.
///
/// BadGateway messages are included: workflows use them for named
/// upstream failures such as image uploads.
pub(crate) fn user_message(err: &Error) -> Option<&str> {
    let quire = QuireError::from_anyhow(err)?;
    (quire.kind.is_user_facing() || quire.kind == ErrorKind::BadGateway).then_some(quire.message.as_str())
}

pub(crate) fn describe(err: &Error, fallback: &str) -> String {
    user_message(err).unwrap_or(fallback).to_string()
}

/// Message of the structured error in `err`, or its display text.
pub(crate) fn detail(err: &Error) -> String {
    QuireError::from_anyhow(err)
        .map(|quire| quire.message.clone())
        .unwrap_or_else(|| err.to_string())
}
