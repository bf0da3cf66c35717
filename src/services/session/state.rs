use crate::dto::auth::AuthRecord;
use crate::dto::users::NormalizedUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
}

/// What consumers observe. Published through a `watch` channel; every change
/// goes through `SessionController::apply`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub auth: Option<AuthRecord>,
    // True until the startup refresh (if any) has finished.
    pub is_loading: bool,
    generation: u64,
}

impl SessionSnapshot {
    pub(crate) fn initial() -> Self {
        Self {
            state: SessionState::Uninitialized,
            auth: None,
            is_loading: true,
            generation: 0,
        }
    }

    pub fn user(&self) -> Option<&NormalizedUser> {
        self.auth.as_ref().and_then(|a| a.user.as_ref())
    }

    pub fn token(&self) -> Option<&str> {
        self.auth.as_ref().and_then(|a| a.token.as_deref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Bumped by every transition that replaces the session: login, logout,
    /// a change from another context or an accepted profile update. Late
    /// responses started under an older generation are discarded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Install `auth` as the current session and start a new generation.
    pub(crate) fn replace(&mut self, auth: Option<AuthRecord>) -> u64 {
        let auth = auth.filter(AuthRecord::is_authenticated);
        self.state = if auth.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        self.auth = auth;
        self.generation += 1;
        self.generation
    }

    /// Swap in a fresher copy of the same session (generation unchanged).
    pub(crate) fn overwrite(&mut self, auth: AuthRecord) {
        self.state = if auth.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        self.auth = Some(auth).filter(AuthRecord::is_authenticated);
    }
}
