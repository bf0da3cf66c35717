pub mod auth;
pub mod users;

pub use auth::{AuthRecord, StoredAuthRecord};
pub use users::{NormalizedUser, ProfileUpdate, Role, UserId};
