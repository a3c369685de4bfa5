//! Application context: the composition root for stores and services.
//!
//! One [`AppContext`] owns the navigation store, the auth store wired to
//! it, and the three entity services. UI code receives the context by
//! reference instead of reaching for process-wide state.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use crate::config::{BackendConnection, BackendSettings};
use crate::domain::ports::{DocumentStore, IdentityProvider, LocalStorage};
use crate::domain::{BudgetService, CategoryService, TransactionService};
use crate::state::{AuthStore, NavigationStore};

/// Adapters for a configured backend.
#[derive(Debug)]
pub struct Backend<D, I> {
    pub documents: Arc<D>,
    pub identity: Arc<I>,
}

impl<D, I> Backend<D, I> {
    /// Pair a document store with an identity provider.
    pub const fn new(documents: Arc<D>, identity: Arc<I>) -> Self {
        Self {
            documents,
            identity,
        }
    }
}

/// Stores and services sharing one optional backend and clock.
pub struct AppContext<D, I, S> {
    navigation: Arc<NavigationStore<S>>,
    auth: AuthStore<I, S>,
    budgets: BudgetService<D>,
    categories: CategoryService<D>,
    transactions: TransactionService<D>,
    backend_configured: bool,
}

impl<D, I, S> AppContext<D, I, S>
where
    D: DocumentStore,
    I: IdentityProvider + 'static,
    S: LocalStorage,
{
    /// Build a context. `backend` is `None` when the backend is not
    /// configured; services then degrade and the auth store stays signed
    /// out.
    pub fn new(backend: Option<Backend<D, I>>, storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let backend_configured = backend.is_some();
        let (documents, identity) = backend
            .map(|backend| (backend.documents, backend.identity))
            .unzip();
        let navigation = Arc::new(NavigationStore::new(storage));
        Self {
            auth: AuthStore::new(identity, Arc::clone(&navigation)),
            navigation,
            budgets: BudgetService::with_store(documents.clone(), Arc::clone(&clock)),
            categories: CategoryService::with_store(documents.clone(), Arc::clone(&clock)),
            transactions: TransactionService::with_store(documents, clock),
            backend_configured,
        }
    }

    /// Build a context from loaded settings.
    ///
    /// Incomplete settings are logged and yield a context without a
    /// backend. Otherwise `factory` builds the adapters.
    ///
    /// # Errors
    ///
    /// Returns whatever `factory` returns when it fails.
    pub fn connect<F, E>(
        settings: &BackendSettings,
        factory: F,
        storage: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, E>
    where
        F: FnOnce(&BackendConnection) -> Result<Backend<D, I>, E>,
    {
        let Some(connection) = settings.connection() else {
            if settings.enabled {
                warn!(
                    missing = ?settings.missing_required(),
                    "backend settings incomplete; running without a backend"
                );
            } else {
                info!("backend disabled; running without a backend");
            }
            return Ok(Self::new(None, storage, clock));
        };
        let backend = factory(&connection)?;
        info!(project_id = %connection.project_id, "backend configured");
        Ok(Self::new(Some(backend), storage, clock))
    }

    /// Load navigation history, then attach the auth store to identity
    /// notifications.
    ///
    /// # Panics
    ///
    /// See [`AuthStore::init`].
    pub fn init(&self) {
        self.navigation.init();
        self.auth.init();
    }

    /// Navigation store.
    #[must_use]
    pub fn navigation(&self) -> &NavigationStore<S> {
        &self.navigation
    }

    /// Auth store.
    #[must_use]
    pub const fn auth(&self) -> &AuthStore<I, S> {
        &self.auth
    }

    /// Budget line item service.
    #[must_use]
    pub const fn budgets(&self) -> &BudgetService<D> {
        &self.budgets
    }

    /// Category service.
    #[must_use]
    pub const fn categories(&self) -> &CategoryService<D> {
        &self.categories
    }

    /// Transaction service.
    #[must_use]
    pub const fn transactions(&self) -> &TransactionService<D> {
        &self.transactions
    }

    /// Whether a backend was configured at construction.
    #[must_use]
    pub const fn is_backend_configured(&self) -> bool {
        self.backend_configured
    }
}

impl<D, I, S> AppContext<D, I, S> {
    /// Detach the auth store from identity notifications.
    pub fn dispose(&self) {
        self.auth.dispose();
    }
}
