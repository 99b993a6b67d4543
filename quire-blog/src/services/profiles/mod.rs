pub mod profiles_service;
pub mod profiles_shared;

pub use profiles_service::ProfilesService;
pub use profiles_shared::{AvatarUpload, OwnProfile, ProfileUpdate, PublicProfile};
