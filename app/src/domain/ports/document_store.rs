//! Port for the hosted document store.
//!
//! The [`DocumentStore`] trait is the only way entity services reach
//! persisted data. Adapters translate [`DocumentQuery`] values into the
//! backend's query language and map backend failures onto
//! [`DocumentStoreError`].

use async_trait::async_trait;

use crate::domain::{Document, DocumentId, DocumentQuery, Fields};

use super::define_port_error;

define_port_error! {
    /// Errors raised by document store adapters.
    pub enum DocumentStoreError {
        /// The store could not be reached.
        Unavailable { message: String } =>
            "document store unavailable: {message}",
        /// The backend refused the operation for the current identity.
        PermissionDenied { message: String } =>
            "document store permission denied: {message}",
        /// The addressed document does not exist.
        NotFound { collection: String, id: String } =>
            "document {collection}/{id} not found",
        /// The backend rejected the request.
        Rejected { message: String } =>
            "document store rejected the request: {message}",
    }
}

/// Port for typed document collections.
///
/// # Semantics
///
/// - `query` applies every equality and range filter and returns documents
///   in the requested order. Without an ordering the order is unspecified.
/// - `create` assigns a fresh identifier.
/// - `create_if_absent` writes only when no document with `id` exists and
///   reports whether it wrote. Adapters must make the check and the write
///   atomic.
/// - `patch` merges the supplied fields into an existing document and fails
///   with [`DocumentStoreError::NotFound`] when it is missing.
/// - `remove` succeeds whether or not the document exists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a filtered, optionally ordered read.
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>, DocumentStoreError>;

    /// Create a document with a backend-assigned identifier.
    async fn create(
        &self,
        collection: &str,
        fields: Fields,
    ) -> Result<DocumentId, DocumentStoreError>;

    /// Create a document under `id` unless one already exists.
    async fn create_if_absent(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> Result<bool, DocumentStoreError>;

    /// Merge `fields` into an existing document.
    async fn patch(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> Result<(), DocumentStoreError>;

    /// Delete a document.
    async fn remove(&self, collection: &str, id: &DocumentId) -> Result<(), DocumentStoreError>;
}
