/*
 * Responsibility
 * - Owns the in-memory session (watch channel) and is the only place that mutates it
 * - Startup: restore from storage, refresh the user in the background
 * - Cross-context sync: follow writes other contexts make to AUTH_KEY
 * - Consumer operations: set_auth_from_payload / logout / update_user
 *
 * Nothing here returns an error to consumers: failures end in a safe state
 * (stale-but-valid session, anonymous session or `false`) and are logged.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::dto::auth::AuthRecord;
use crate::dto::users::{NormalizedUser, ProfileUpdate, UserId};
use crate::repos::auth_repo::{self, AUTH_KEY};
use crate::services::api::UserApi;
use crate::services::normalize::normalize;
use crate::services::payload::{extract, unwrap_user_response};
use crate::services::session::navigator::Navigator;
use crate::services::session::state::{SessionSnapshot, SessionState};
use crate::services::session::update::build_update_body;
use crate::services::storage::KeyValueStore;

/// Session controller. Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn UserApi>,
    navigator: Arc<dyn Navigator>,
    landing_path: String,
    state: watch::Sender<SessionSnapshot>,
    started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.get_mut() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

enum Change {
    // Uninitialized -> Loading
    Begin,
    // Result of reading storage at startup.
    Restore {
        auth: Option<AuthRecord>,
        is_loading: bool,
    },
    Login(AuthRecord),
    Logout,
    // Another context rewrote (or removed) the stored record.
    External(Option<AuthRecord>),
    // Fresh user for the session that was current at `expected`.
    Refresh {
        expected: u64,
        auth: AuthRecord,
    },
    // Accepted profile update. Starts a new generation so an older
    // in-flight refresh cannot overwrite it.
    Update {
        expected: u64,
        auth: AuthRecord,
    },
    LoadingDone,
}

impl SessionController {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn UserApi>,
        navigator: Arc<dyn Navigator>,
        landing_path: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::initial());
        Self {
            inner: Arc::new(Inner {
                store,
                api,
                navigator,
                landing_path: landing_path.into(),
                state,
                started: AtomicBool::new(false),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().state
    }

    pub fn auth(&self) -> Option<AuthRecord> {
        self.inner.state.borrow().auth.clone()
    }

    pub fn user(&self) -> Option<NormalizedUser> {
        self.inner.state.borrow().user().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Receiver that sees every session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Wait until startup (including the background refresh) is over.
    /// Only resolves after `start()` has been called.
    pub async fn ready(&self) -> SessionSnapshot {
        let mut rx = self.subscribe();
        match rx
            .wait_for(|s| s.state != SessionState::Uninitialized && !s.is_loading)
            .await
        {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Restore the session from storage and start following other contexts.
    ///
    /// Storage is read synchronously; the refresh runs as a background task,
    /// so this must be called inside a Tokio runtime. Calling it twice is a
    /// no-op.
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("session already started");
            return;
        }
        self.apply(Change::Begin);

        // Subscribe before reading so a concurrent write is not missed.
        self.spawn_listener();

        let stored = auth_repo::load(self.inner.store.as_ref())
            .and_then(|record| record.token.clone().map(|token| (token, record)));

        let Some((token, record)) = stored else {
            tracing::debug!("no stored session");
            self.apply(Change::Restore {
                auth: None,
                is_loading: false,
            });
            return;
        };

        let Some(id) = record.user_id().cloned() else {
            tracing::debug!("stored session has no user id; skipping refresh");
            self.apply(Change::Restore {
                auth: Some(record),
                is_loading: false,
            });
            return;
        };

        let base = record.clone();
        let Some(generation) = self.apply(Change::Restore {
            auth: Some(record),
            is_loading: true,
        }) else {
            return;
        };

        tracing::debug!(%id, generation, "restored session; refreshing user");
        let controller = self.clone();
        let handle = tokio::spawn(async move {
            controller.refresh(id, token, base, generation).await;
        });
        self.track(handle);
    }

    /// Stop following other contexts and cancel background work.
    pub fn shutdown(&self) {
        if let Ok(mut tasks) = self.inner.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }

    /// Install the session carried by a login/refresh response.
    pub fn set_auth_from_payload(&self, payload: Value) -> SessionState {
        let extracted = extract(payload);
        tracing::debug!(shape = ?extracted.shape, "auth payload received");

        self.apply(Change::Login(extracted.into_record()));
        self.state()
    }

    pub fn logout(&self) {
        self.apply(Change::Logout);

        if let Err(e) = self.inner.navigator.navigate(&self.inner.landing_path) {
            tracing::warn!(error = %e, "navigation after logout failed");
        }
    }

    /// Push a profile change to the backend and adopt the user it returns.
    ///
    /// Returns `false` without any request when there is no token or user id,
    /// and `false` when the backend rejects the update.
    pub async fn update_user(&self, update: ProfileUpdate) -> bool {
        let snapshot = self.snapshot();
        let Some(auth) = snapshot.auth.clone() else {
            tracing::debug!("update_user without a session");
            return false;
        };
        let (Some(token), Some(id)) = (auth.token.clone(), auth.user_id().cloned()) else {
            tracing::debug!("update_user needs a token and a user id");
            return false;
        };

        let role = auth.user.as_ref().map(|u| u.role.clone()).unwrap_or_default();
        let body = build_update_body(&role, &update);
        tracing::debug!(%id, %role, ?body, "sending profile update");

        let payload = match self.inner.api.update_user(&id, &token, &body).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, %id, "update error");
                return false;
            }
        };
        tracing::debug!(%id, "profile update accepted");

        let Some(user) = normalize(unwrap_user_response(&payload)) else {
            tracing::warn!(%id, "update response carried no user");
            return false;
        };

        let auth = AuthRecord {
            user: Some(user),
            ..auth
        };
        if self
            .apply(Change::Update {
                expected: snapshot.generation(),
                auth,
            })
            .is_none()
        {
            tracing::warn!(%id, "session changed while the update was in flight; not applied");
            return false;
        }
        true
    }

    async fn refresh(&self, id: UserId, token: String, base: AuthRecord, generation: u64) {
        match self.inner.api.fetch_user(&id, &token).await {
            Ok(payload) => match normalize(unwrap_user_response(&payload)) {
                Some(user) => {
                    let auth = AuthRecord {
                        user: Some(user),
                        ..base
                    };
                    if self
                        .apply(Change::Refresh {
                            expected: generation,
                            auth,
                        })
                        .is_none()
                    {
                        tracing::info!(%id, "session changed during refresh; discarding result");
                    }
                }
                None => tracing::warn!(%id, "refresh response carried no user"),
            },
            Err(e) => {
                tracing::error!(
                    error = %e,
                    %id,
                    backend = self.inner.api.backend_name(),
                    "error loading user data"
                );
            }
        }

        self.apply(Change::LoadingDone);
    }

    fn spawn_listener(&self) {
        let mut events = self.inner.store.subscribe();
        let own = self.inner.store.context_id();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => Some(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "storage events lagged; re-reading storage");
                        None
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let controller = SessionController { inner };

                match event {
                    Some(event) if event.key == AUTH_KEY && event.origin != own => {
                        tracing::debug!(
                            origin = %event.origin,
                            "auth record changed in another context"
                        );
                        controller.on_storage_change(event.new_value.as_deref());
                    }
                    Some(_) => {}
                    None => {
                        let auth = auth_repo::load(controller.inner.store.as_ref());
                        controller.apply(Change::External(auth));
                    }
                }
            }
        });
        self.track(handle);
    }

    fn on_storage_change(&self, new_value: Option<&str>) {
        let auth = match new_value {
            None => None,
            Some(raw) => match auth_repo::decode(raw) {
                Ok(auth) => Some(auth),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "unusable auth record from another context; logging out"
                    );
                    None
                }
            },
        };
        self.apply(Change::External(auth));
    }

    fn track(&self, handle: JoinHandle<()>) {
        match self.inner.tasks.lock() {
            Ok(mut tasks) => {
                tasks.retain(|t| !t.is_finished());
                tasks.push(handle);
            }
            Err(_) => tracing::warn!("task registry poisoned; background task left untracked"),
        }
    }

    /// Single mutation point. Storage writes that belong to a transition
    /// happen while the state is locked, so memory and storage move together.
    ///
    /// Returns the session generation after the change, or `None` when the
    /// change was discarded.
    fn apply(&self, change: Change) -> Option<u64> {
        let store = self.inner.store.as_ref();
        let mut applied = None;

        self.inner.state.send_if_modified(|snap| {
            match change {
                Change::Begin => {
                    snap.state = SessionState::Loading;
                    snap.is_loading = true;
                }
                Change::Restore { auth, is_loading } => {
                    snap.is_loading = is_loading;
                    snap.replace(auth);
                }
                Change::Login(auth) => {
                    auth_repo::save(store, &auth);
                    snap.replace(Some(auth));
                }
                Change::Logout => {
                    auth_repo::clear(store);
                    snap.replace(None);
                }
                Change::External(auth) => {
                    snap.replace(auth);
                }
                Change::Refresh { expected, auth } => {
                    if snap.generation() != expected {
                        return false;
                    }
                    auth_repo::save(store, &auth);
                    snap.overwrite(auth);
                }
                Change::Update { expected, auth } => {
                    if snap.generation() != expected {
                        return false;
                    }
                    auth_repo::save(store, &auth);
                    snap.replace(Some(auth));
                }
                Change::LoadingDone => {
                    if !snap.is_loading {
                        return false;
                    }
                    snap.is_loading = false;
                }
            }

            tracing::debug!(
                state = ?snap.state,
                generation = snap.generation(),
                loading = snap.is_loading,
                "session transition"
            );
            applied = Some(snap.generation());
            true
        });

        applied
    }
}
