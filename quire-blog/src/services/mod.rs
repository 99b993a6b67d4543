use std::sync::Arc;

pub mod types;
pub use types::{BlogSettings, BlogState};

pub mod accounts;
pub mod follows;
pub mod posts;
pub mod profiles;

pub use accounts::AccountsService;
pub use follows::FollowsService;
pub use posts::PostsService;
pub use profiles::ProfilesService;

/// Every workflow service over one shared [`BlogState`].
#[derive(Clone)]
pub struct BlogServices {
    pub state: Arc<BlogState>,
    pub posts: Arc<PostsService>,
    pub follows: Arc<FollowsService>,
    pub profiles: Arc<ProfilesService>,
    pub accounts: Arc<AccountsService>,
}

pub fn configure(state: Arc<BlogState>) -> BlogServices {
    BlogServices {
        posts: Arc::new(PostsService::new(Arc::clone(&state))),
        follows: Arc::new(FollowsService::new(Arc::clone(&state))),
        profiles: Arc::new(ProfilesService::new(Arc::clone(&state))),
        accounts: Arc::new(AccountsService::new(Arc::clone(&state))),
        state,
    }
}
