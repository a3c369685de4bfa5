//! Driven ports for the backend and device storage.

mod macros;
pub(crate) use macros::define_port_error;

mod document_store;
mod identity_provider;
mod local_storage;

#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{DocumentStore, DocumentStoreError};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{IdentityChanges, IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use local_storage::MockLocalStorage;
pub use local_storage::{LocalStorage, LocalStorageError};
