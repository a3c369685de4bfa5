//! Observable client state: authentication and navigation history.

pub mod auth_store;
pub mod navigation_store;

pub use auth_store::{AuthState, AuthStore};
pub use navigation_store::{
    DEFAULT_REDIRECT_PAGE, NAVIGATION_STATE_KEY, NavigationState, NavigationStore,
};
