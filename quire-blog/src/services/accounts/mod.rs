pub mod accounts_service;

pub use accounts_service::{AccountsService, AuthSession, LoginInput, RegisterInput};
