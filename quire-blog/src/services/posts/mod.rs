pub mod externalize;
pub mod posts_service;
pub mod posts_shared;

pub use externalize::{discard_uploads, externalize_images, Externalized};
pub use posts_service::PostsService;
pub use posts_shared::{DraftInput, PublishInput};
