//! Outbound adapters implementing the domain ports in-process.
//!
//! The hosted backend adapters live outside this crate; these adapters let
//! the client core run locally and back the behaviour tests.

mod local_storage;
mod memory_document_store;
mod memory_identity;

pub use local_storage::{DirLocalStorage, InMemoryLocalStorage};
pub use memory_document_store::InMemoryDocumentStore;
pub use memory_identity::InMemoryIdentityProvider;
