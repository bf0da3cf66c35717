/*
 * Responsibility
 * - Client-side session layer of the BeautyRoom booking front end
 *   - dto: AuthRecord / NormalizedUser / ProfileUpdate
 *   - repos: the persisted auth record (best effort)
 *   - services: storage backends, payload extraction, user normalization,
 *     backend user API, session controller
 */
pub mod config;
pub mod dto;
pub mod error;
pub mod repos;
pub mod services;
pub mod state;

pub use dto::{AuthRecord, NormalizedUser, ProfileUpdate, Role, UserId};
pub use repos::auth_repo::AUTH_KEY;
pub use services::session::{SessionController, SessionSnapshot, SessionState};
