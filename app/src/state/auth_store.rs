//! Authentication state driven by identity-change notifications.
//!
//! [`AuthStore`] publishes an [`AuthState`] snapshot through a `watch`
//! channel. Snapshots are only ever replaced whole, so subscribers never
//! observe a half-applied transition.

use std::future::poll_fn;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::ports::{IdentityChanges, IdentityProvider, IdentityProviderError, LocalStorage};
use crate::domain::{Error, LoginCredentials, Session};
use crate::state::NavigationStore;

/// Snapshot of the authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<Session>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl AuthState {
    /// Initial state before the first identity notification.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
        }
    }

    /// Signed in as `session`.
    #[must_use]
    pub const fn authenticated(session: Session) -> Self {
        Self {
            user: Some(session),
            is_authenticated: true,
            is_loading: false,
        }
    }

    /// Signed out.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: false,
        }
    }

    fn from_identity(identity: Option<Session>) -> Self {
        identity.map_or_else(Self::signed_out, Self::authenticated)
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::loading()
    }
}

#[derive(Debug, Clone, Copy)]
enum Submission {
    SignIn,
    SignUp,
}

impl Submission {
    const fn failure_prefix(self) -> &'static str {
        match self {
            Self::SignIn => "failed to sign in",
            Self::SignUp => "failed to sign up",
        }
    }
}

/// Observable authentication state with signup, login and logout entry
/// points.
///
/// Identity notifications are received and applied while holding the
/// `changes` lock. [`AuthStore::logout`] takes the same lock to discard
/// queued notifications before forcing the signed-out state, so a change
/// emitted before the reset can never overwrite it.
pub struct AuthStore<I, S> {
    identity: Option<Arc<I>>,
    navigation: Arc<NavigationStore<S>>,
    state: Arc<watch::Sender<AuthState>>,
    changes: Arc<Mutex<Option<IdentityChanges>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<I, S> AuthStore<I, S>
where
    I: IdentityProvider + 'static,
    S: LocalStorage,
{
    /// Create a store in the loading state. `identity` is `None` when the
    /// backend is not configured.
    pub fn new(identity: Option<Arc<I>>, navigation: Arc<NavigationStore<S>>) -> Self {
        let (state, _) = watch::channel(AuthState::loading());
        Self {
            identity,
            navigation,
            state: Arc::new(state),
            changes: Arc::new(Mutex::new(None)),
            listener: Mutex::new(None),
        }
    }

    /// Attach to identity-change notifications. Repeated calls are no-ops
    /// until [`Self::dispose`].
    ///
    /// Without an identity provider the store publishes the signed-out
    /// state immediately.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime with an identity provider
    /// configured, since the notification listener is spawned onto it.
    pub fn init(&self) {
        let mut listener = lock(&self.listener);
        if listener.is_some() {
            return;
        }
        let Some(identity) = self.identity.as_ref() else {
            debug!("identity provider not configured; publishing signed-out state");
            self.state.send_replace(AuthState::signed_out());
            return;
        };

        *lock(&self.changes) = Some(identity.identity_changes());
        let changes = Arc::clone(&self.changes);
        let state = Arc::clone(&self.state);
        *listener = Some(tokio::spawn(async move {
            while poll_fn(|cx| apply_next_change(&changes, &state, cx)).await {}
            debug!("identity notifications closed");
        }));
    }

    /// Sign in with `email` and `password`.
    ///
    /// On success the state is left for the identity notification to
    /// update. On failure `is_loading` is reset and the error returned.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), Error> {
        self.submit(Submission::SignIn, email, password).await
    }

    /// Create an account for `email` and `password`; the provider signs
    /// it in.
    ///
    /// Follows the same loading and error rules as [`Self::login`]. An email
    /// that already has an account is reported as an invalid request.
    pub async fn signup(&self, email: &str, password: &str) -> Result<(), Error> {
        self.submit(Submission::SignUp, email, password).await
    }

    async fn submit(&self, kind: Submission, email: &str, password: &str) -> Result<(), Error> {
        let credentials = LoginCredentials::try_from_parts(email, password)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let identity = self.identity.as_ref().ok_or_else(|| {
            Error::backend_unavailable(format!(
                "{}: backend not configured",
                kind.failure_prefix()
            ))
        })?;

        self.state.send_modify(|state| state.is_loading = true);
        let outcome = match kind {
            Submission::SignIn => identity.authenticate(&credentials).await,
            Submission::SignUp => identity.create_account(&credentials).await,
        };
        match outcome {
            Ok(session) => {
                info!(user_id = %session.user_id(), ?kind, "identity accepted");
                Ok(())
            }
            Err(err) => {
                self.state.send_modify(|state| state.is_loading = false);
                warn!(error = %err, ?kind, "identity request failed");
                Err(Self::map_identity_error(kind, err))
            }
        }
    }

    /// Sign out, forcing the signed-out state if the provider fails, and
    /// clear navigation history.
    ///
    /// Notifications still queued when the reset happens are discarded.
    pub async fn logout(&self) {
        let outcome = match self.identity.as_ref() {
            Some(identity) => identity.sign_out().await,
            None => Err(IdentityProviderError::unavailable("backend not configured")),
        };
        if let Err(err) = outcome {
            warn!(error = %err, "sign-out failed; resetting local state");
        }
        {
            let mut changes = lock(&self.changes);
            if let Some(receiver) = changes.as_mut() {
                let mut discarded = 0_usize;
                while receiver.try_recv().is_ok() {
                    discarded += 1;
                }
                debug!(discarded, "discarded queued identity notifications");
            }
            self.state.send_replace(AuthState::signed_out());
        }
        self.navigation.clear();
    }

    /// Observe the current snapshot and every later replacement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    fn map_identity_error(kind: Submission, error: IdentityProviderError) -> Error {
        let prefix = kind.failure_prefix();
        match (kind, error) {
            (Submission::SignIn, IdentityProviderError::InvalidCredentials) => {
                Error::unauthorized("invalid email or password")
            }
            (Submission::SignUp, IdentityProviderError::InvalidCredentials) => {
                Error::invalid_request(format!("{prefix}: invalid email or password"))
            }
            (_, IdentityProviderError::AccountExists) => Error::invalid_request(format!(
                "{prefix}: an account already exists for this email"
            )),
            (_, IdentityProviderError::Unavailable { message }) => {
                Error::backend_unavailable(format!("{prefix}: {message}"))
            }
            (_, IdentityProviderError::Rejected { message }) => {
                Error::backend_failure(format!("{prefix}: {message}"))
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Receive one identity change and publish it before releasing the lock.
/// Resolves to `false` once the stream is closed or detached.
fn apply_next_change(
    changes: &Mutex<Option<IdentityChanges>>,
    state: &watch::Sender<AuthState>,
    cx: &mut Context<'_>,
) -> Poll<bool> {
    let mut changes = lock(changes);
    let Some(receiver) = changes.as_mut() else {
        return Poll::Ready(false);
    };
    match receiver.poll_recv(cx) {
        Poll::Ready(Some(change)) => {
            debug!(signed_in = change.is_some(), "identity changed");
            state.send_replace(AuthState::from_identity(change));
            Poll::Ready(true)
        }
        Poll::Ready(None) => Poll::Ready(false),
        Poll::Pending => Poll::Pending,
    }
}

impl<I, S> AuthStore<I, S> {
    /// Detach from identity notifications. The current snapshot is kept.
    pub fn dispose(&self) {
        let handle = lock(&self.listener).take();
        *lock(&self.changes) = None;
        if let Some(handle) = handle {
            handle.abort();
            debug!("auth store detached from identity notifications");
        }
    }
}

impl<I, S> Drop for AuthStore<I, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "auth_store_tests.rs"]
mod tests;
