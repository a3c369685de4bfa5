//! Port for the hosted identity provider.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{LoginCredentials, Session};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// The provider could not be reached.
        Unavailable { message: String } =>
            "identity provider unavailable: {message}",
        /// Email and password did not match an account.
        InvalidCredentials => "invalid credentials",
        /// An account already exists for the email.
        AccountExists => "an account already exists for this email",
        /// The provider rejected the request.
        Rejected { message: String } =>
            "identity provider rejected the request: {message}",
    }
}

/// Ordered stream of identity changes. `None` means signed out.
pub type IdentityChanges = mpsc::UnboundedReceiver<Option<Session>>;

/// Port for account creation, sign-in, sign-out and identity-change
/// notifications.
///
/// A successful [`IdentityProvider::authenticate`] or
/// [`IdentityProvider::create_account`] is also reported through every open
/// [`IdentityChanges`] stream, in emission order. Subscribers receive the
/// current identity as their first item.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Open a notification stream; the current identity is delivered first.
    fn identity_changes(&self) -> IdentityChanges;

    /// Sign in with email and password.
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Session, IdentityProviderError>;

    /// Create an account for the credentials and sign it in.
    async fn create_account(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Session, IdentityProviderError>;

    /// Sign the current user out.
    async fn sign_out(&self) -> Result<(), IdentityProviderError>;
}
