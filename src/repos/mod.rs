pub mod auth_repo;
pub mod error;
