//! In-process identity provider adapter.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::ports::{IdentityChanges, IdentityProvider, IdentityProviderError};
use crate::domain::{LoginCredentials, Session, UserId};

struct Account {
    password: Zeroizing<String>,
    session: Session,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    current: Option<Session>,
    subscribers: Vec<mpsc::UnboundedSender<Option<Session>>>,
}

impl Inner {
    fn notify(&mut self) {
        let current = self.current.clone();
        self.subscribers
            .retain(|subscriber| subscriber.send(current.clone()).is_ok());
    }
}

/// Identity provider backed by an in-memory account table.
///
/// Every subscriber receives the current identity first, then each change
/// in order. Closed subscribers are pruned on the next notification.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    inner: Mutex<Inner>,
}

impl InMemoryIdentityProvider {
    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an account that can later sign in.
    pub fn register(&self, user_id: UserId, email: &str, password: &str) -> Session {
        let session = Session::new(user_id, email.trim());
        self.inner().accounts.insert(
            email.trim().to_owned(),
            Account {
                password: Zeroizing::new(password.to_owned()),
                session: session.clone(),
            },
        );
        session
    }

    /// Currently signed-in session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner().current.clone()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn identity_changes(&self) -> IdentityChanges {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner();
        if sender.send(inner.current.clone()).is_ok() {
            inner.subscribers.push(sender);
        }
        receiver
    }

    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Session, IdentityProviderError> {
        let mut inner = self.inner();
        let session = inner
            .accounts
            .get(credentials.email())
            .filter(|account| account.password.as_str() == credentials.password())
            .map(|account| account.session.clone())
            .ok_or(IdentityProviderError::InvalidCredentials)?;
        inner.current = Some(session.clone());
        inner.notify();
        debug!(user_id = %session.user_id(), "identity signed in");
        Ok(session)
    }

    async fn create_account(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Session, IdentityProviderError> {
        let user_id = UserId::new(Uuid::new_v4().to_string())
            .map_err(|err| IdentityProviderError::rejected(err.to_string()))?;
        let mut inner = self.inner();
        if inner.accounts.contains_key(credentials.email()) {
            return Err(IdentityProviderError::AccountExists);
        }
        let session = Session::new(user_id, credentials.email());
        inner.accounts.insert(
            credentials.email().to_owned(),
            Account {
                password: Zeroizing::new(credentials.password().to_owned()),
                session: session.clone(),
            },
        );
        inner.current = Some(session.clone());
        inner.notify();
        debug!(user_id = %session.user_id(), "identity created");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), IdentityProviderError> {
        let mut inner = self.inner();
        inner.current = None;
        inner.notify();
        debug!("identity signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn provider() -> InMemoryIdentityProvider {
        let provider = InMemoryIdentityProvider::default();
        provider.register(UserId::new("uid-1").expect("valid id"), "ada@example.com", "secret");
        provider
    }

    fn credentials(password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts("ada@example.com", password).expect("valid credentials")
    }

    #[rstest]
    #[tokio::test]
    async fn subscribers_see_current_identity_then_changes(provider: InMemoryIdentityProvider) {
        let mut changes = provider.identity_changes();
        assert_eq!(changes.recv().await, Some(None));

        let session = provider
            .authenticate(&credentials("secret"))
            .await
            .expect("sign in");
        assert_eq!(changes.recv().await, Some(Some(session)));

        provider.sign_out().await.expect("sign out");
        assert_eq!(changes.recv().await, Some(None));
    }

    #[rstest]
    #[tokio::test]
    async fn created_accounts_are_signed_in_and_can_sign_in_again() {
        let provider = InMemoryIdentityProvider::default();
        let mut changes = provider.identity_changes();
        assert_eq!(changes.recv().await, Some(None));

        let created = provider
            .create_account(&credentials("secret"))
            .await
            .expect("create account");
        assert_eq!(created.email(), "ada@example.com");
        assert_eq!(changes.recv().await, Some(Some(created.clone())));

        provider.sign_out().await.expect("sign out");
        let signed_in = provider
            .authenticate(&credentials("secret"))
            .await
            .expect("sign in");
        assert_eq!(signed_in, created);
    }

    #[rstest]
    #[tokio::test]
    async fn existing_email_cannot_be_registered_twice(provider: InMemoryIdentityProvider) {
        let err = provider
            .create_account(&credentials("other"))
            .await
            .expect_err("duplicate email");
        assert_eq!(err, IdentityProviderError::AccountExists);
        assert_eq!(provider.current(), None);
    }

    #[rstest]
    #[tokio::test]
    async fn wrong_password_is_rejected(provider: InMemoryIdentityProvider) {
        let err = provider
            .authenticate(&credentials("nope"))
            .await
            .expect_err("wrong password");
        assert_eq!(err, IdentityProviderError::InvalidCredentials);
        assert_eq!(provider.current(), None);
    }
}
