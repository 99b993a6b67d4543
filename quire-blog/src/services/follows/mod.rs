pub mod follows_service;

pub use follows_service::FollowsService;
