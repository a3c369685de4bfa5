//! Navigation history persisted to local storage.
//!
//! The store tracks the current and previous page and whether this is the
//! first visit. Every change is written through to [`LocalStorage`] so the
//! post-login redirect survives a reload.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::ports::LocalStorage;

/// Local storage key holding the serialised [`NavigationState`].
pub const NAVIGATION_STATE_KEY: &str = "navigation-state";
/// Page used when no meaningful redirect target is known.
pub const DEFAULT_REDIRECT_PAGE: &str = "/dashboard";

const ROOT_PAGE: &str = "/";
const LOGIN_PAGE: &str = "/login";

/// Snapshot of the navigation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub current_page: String,
    pub previous_page: Option<String>,
    #[serde(default)]
    pub is_first_visit: bool,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            current_page: ROOT_PAGE.to_owned(),
            previous_page: None,
            is_first_visit: true,
        }
    }
}

/// Observable navigation state backed by local storage.
///
/// Storage failures never reach callers: unreadable or corrupt state reads
/// as absent and failed writes are logged.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use my_money::outbound::InMemoryLocalStorage;
/// use my_money::state::NavigationStore;
///
/// let store = NavigationStore::new(Arc::new(InMemoryLocalStorage::default()));
/// store.init();
/// store.navigate_to("/reports");
/// assert_eq!(store.redirect_page(), "/reports");
/// ```
pub struct NavigationStore<S> {
    storage: Arc<S>,
    state: watch::Sender<NavigationState>,
}

impl<S> NavigationStore<S>
where
    S: LocalStorage,
{
    /// Create a store holding default state until [`Self::init`] runs.
    pub fn new(storage: Arc<S>) -> Self {
        let (state, _) = watch::channel(NavigationState::default());
        Self { storage, state }
    }

    /// Load persisted state, marking it as a return visit.
    pub fn init(&self) {
        let next = self.read_persisted().map_or_else(NavigationState::default, |state| {
            NavigationState {
                is_first_visit: false,
                ..state
            }
        });
        debug!(page = %next.current_page, first_visit = next.is_first_visit, "navigation state loaded");
        self.state.send_replace(next);
    }

    /// Record a move to `page` and persist it.
    pub fn navigate_to(&self, page: impl Into<String>) {
        let page = page.into();
        self.state.send_modify(|state| {
            let previous = std::mem::replace(&mut state.current_page, page);
            state.previous_page = Some(previous);
            state.is_first_visit = false;
        });
        let snapshot = self.snapshot();
        self.persist(&snapshot);
    }

    /// Forget persisted history and reset to defaults.
    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(NAVIGATION_STATE_KEY) {
            warn!(error = %err, "failed to clear persisted navigation state");
        }
        self.state.send_replace(NavigationState::default());
    }

    /// Page to open after login.
    ///
    /// Reads storage rather than the live snapshot so the answer survives a
    /// reload between navigation and login.
    #[must_use]
    pub fn redirect_page(&self) -> String {
        match self.read_persisted() {
            Some(state) if state.current_page != ROOT_PAGE && state.current_page != LOGIN_PAGE => {
                state.current_page
            }
            _ => DEFAULT_REDIRECT_PAGE.to_owned(),
        }
    }

    /// Observe the current snapshot and every later replacement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.state.subscribe()
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> NavigationState {
        self.state.borrow().clone()
    }

    fn read_persisted(&self) -> Option<NavigationState> {
        let raw = match self.storage.get(NAVIGATION_STATE_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "navigation state unreadable; using defaults");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|err| warn!(error = %err, "navigation state corrupt; using defaults"))
            .ok()
    }

    fn persist(&self, state: &NavigationState) {
        let result = serde_json::to_string(state)
            .map_err(|err| err.to_string())
            .and_then(|raw| {
                self.storage
                    .set(NAVIGATION_STATE_KEY, &raw)
                    .map_err(|err| err.to_string())
            });
        if let Err(error) = result {
            warn!(%error, "failed to persist navigation state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{LocalStorageError, MockLocalStorage};
    use crate::outbound::InMemoryLocalStorage;
    use rstest::{fixture, rstest};

    #[fixture]
    fn storage() -> Arc<InMemoryLocalStorage> {
        Arc::new(InMemoryLocalStorage::default())
    }

    #[rstest]
    fn fresh_store_starts_on_first_visit(storage: Arc<InMemoryLocalStorage>) {
        let store = NavigationStore::new(storage);
        store.init();
        assert_eq!(store.snapshot(), NavigationState::default());
    }

    #[rstest]
    fn init_marks_persisted_state_as_return_visit(storage: Arc<InMemoryLocalStorage>) {
        storage
            .set(
                NAVIGATION_STATE_KEY,
                r#"{"currentPage":"/budget","previousPage":"/","isFirstVisit":true}"#,
            )
            .expect("seed storage");
        let store = NavigationStore::new(storage);
        store.init();

        let state = store.snapshot();
        assert_eq!(state.current_page, "/budget");
        assert_eq!(state.previous_page.as_deref(), Some("/"));
        assert!(!state.is_first_visit);
    }

    #[rstest]
    fn navigate_shifts_pages_and_persists(storage: Arc<InMemoryLocalStorage>) {
        let store = NavigationStore::new(Arc::clone(&storage));
        store.init();
        store.navigate_to("/budget");
        store.navigate_to("/reports");

        let expected = NavigationState {
            current_page: "/reports".to_owned(),
            previous_page: Some("/budget".to_owned()),
            is_first_visit: false,
        };
        assert_eq!(store.snapshot(), expected);
        let raw = storage
            .get(NAVIGATION_STATE_KEY)
            .expect("read storage")
            .expect("state persisted");
        let persisted: NavigationState = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(persisted, expected);
    }

    #[rstest]
    #[case("/reports", "/reports")]
    #[case("/login", DEFAULT_REDIRECT_PAGE)]
    #[case("/", DEFAULT_REDIRECT_PAGE)]
    fn redirect_reads_persisted_page(
        storage: Arc<InMemoryLocalStorage>,
        #[case] page: &str,
        #[case] expected: &str,
    ) {
        NavigationStore::new(Arc::clone(&storage)).navigate_to(page);
        let reloaded = NavigationStore::new(storage);
        assert_eq!(reloaded.redirect_page(), expected);
    }

    #[rstest]
    fn redirect_defaults_when_nothing_is_persisted(storage: Arc<InMemoryLocalStorage>) {
        assert_eq!(NavigationStore::new(storage).redirect_page(), DEFAULT_REDIRECT_PAGE);
    }

    #[rstest]
    fn corrupt_state_reads_as_absent(storage: Arc<InMemoryLocalStorage>) {
        storage
            .set(NAVIGATION_STATE_KEY, "{not json")
            .expect("seed storage");
        let store = NavigationStore::new(storage);
        store.init();
        assert!(store.snapshot().is_first_visit);
        assert_eq!(store.redirect_page(), DEFAULT_REDIRECT_PAGE);
    }

    #[rstest]
    fn clear_removes_persisted_state(storage: Arc<InMemoryLocalStorage>) {
        let store = NavigationStore::new(Arc::clone(&storage));
        store.navigate_to("/reports");
        store.clear();

        assert_eq!(store.snapshot(), NavigationState::default());
        assert_eq!(storage.get(NAVIGATION_STATE_KEY).expect("read storage"), None);
    }

    #[rstest]
    fn storage_failures_are_swallowed() {
        let mut storage = MockLocalStorage::new();
        storage
            .expect_get()
            .returning(|key| Err(LocalStorageError::read(key, "denied")));
        storage
            .expect_set()
            .returning(|key, _| Err(LocalStorageError::write(key, "quota")));
        storage
            .expect_remove()
            .returning(|key| Err(LocalStorageError::remove(key, "denied")));

        let store = NavigationStore::new(Arc::new(storage));
        store.init();
        store.navigate_to("/reports");
        assert_eq!(store.snapshot().current_page, "/reports");
        assert_eq!(store.redirect_page(), DEFAULT_REDIRECT_PAGE);
        store.clear();
        assert_eq!(store.snapshot(), NavigationState::default());
    }

    #[rstest]
    fn subscribers_see_replacements(storage: Arc<InMemoryLocalStorage>) {
        let store = NavigationStore::new(storage);
        let mut receiver = store.subscribe();
        store.navigate_to("/budget");
        assert!(receiver.has_changed().expect("sender alive"));
        assert_eq!(receiver.borrow_and_update().current_page, "/budget");
    }
}
