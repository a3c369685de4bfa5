//! Generic entity access service over the document store port.
//!
//! Budget items, categories and transactions share one contract: create
//! scoped to a user, list scoped by equality on `userId`, merge-patch with an
//! `updatedAt` stamp, and unconditional delete. [`EntityKind`] captures what
//! differs per kind (collection, codec, ordering, validation) and
//! [`EntityService`] implements the contract once.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::ports::{DocumentStore, DocumentStoreError};
use crate::domain::{
    Document, DocumentDecodeError, DocumentId, DocumentQuery, Error, FieldValue, Fields, UserId,
    UPDATED_AT_FIELD, USER_ID_FIELD,
};

/// Describes how one entity kind maps onto a document collection.
pub trait EntityKind: Send + Sync + 'static {
    /// Decoded entity returned by reads.
    type Entity: Send;
    /// Input accepted by `add`.
    type Draft: Send;
    /// Partial update accepted by `update`; `None` fields are left unchanged.
    type Patch: Send;

    /// Backend collection name.
    const COLLECTION: &'static str;
    /// Human-readable singular label used in error messages.
    const LABEL: &'static str;

    /// Reject drafts that fail a precondition.
    fn validate(_draft: &Self::Draft) -> Result<(), Error> {
        Ok(())
    }

    /// Reject patches that would break a precondition.
    fn validate_patch(_patch: &Self::Patch) -> Result<(), Error> {
        Ok(())
    }

    /// Encode a draft, stamping ownership and creation metadata.
    fn draft_fields(draft: Self::Draft, user_id: &UserId, now: DateTime<Utc>) -> Fields;

    /// Encode only the fields a patch supplies.
    fn patch_fields(patch: Self::Patch) -> Fields;

    /// Decode a stored document. `now` backs documented timestamp fallbacks.
    fn decode(document: &Document, now: DateTime<Utc>) -> Result<Self::Entity, DocumentDecodeError>;

    /// Owner of a decoded entity.
    fn owner(entity: &Self::Entity) -> &UserId;

    /// Base listing query for `user_id`.
    fn list_query(user_id: &UserId) -> DocumentQuery {
        DocumentQuery::new(Self::COLLECTION).where_eq(USER_ID_FIELD, user_id)
    }

    /// Client-side ordering applied after decoding.
    fn sort(_entities: &mut [Self::Entity]) {}
}

/// Entity access service for one [`EntityKind`].
///
/// A service built without a store models the unconfigured backend: reads
/// return an empty list and writes fail with
/// [`ErrorCode::BackendUnavailable`](crate::domain::ErrorCode::BackendUnavailable).
pub struct EntityService<K, D> {
    store: Option<Arc<D>>,
    clock: Arc<dyn Clock>,
    kind: PhantomData<fn() -> K>,
}

impl<K, D> Clone for EntityService<K, D> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: Arc::clone(&self.clock),
            kind: PhantomData,
        }
    }
}

impl<K, D> EntityService<K, D>
where
    K: EntityKind,
    D: DocumentStore,
{
    /// Create a service backed by `store`.
    pub fn new(store: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self::with_store(Some(store), clock)
    }

    /// Create a service for an unconfigured backend.
    pub fn unavailable(clock: Arc<dyn Clock>) -> Self {
        Self::with_store(None, clock)
    }

    /// Create a service from an optional store.
    pub fn with_store(store: Option<Arc<D>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            kind: PhantomData,
        }
    }

    /// Whether a backend store is configured.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.store.is_some()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    pub(crate) fn store(&self, operation: &str) -> Result<&D, Error> {
        self.store.as_deref().ok_or_else(|| {
            Error::backend_unavailable(format!(
                "failed to {operation} {}: backend not configured",
                K::LABEL
            ))
        })
    }

    /// Create an entity owned by `user_id` and return its identifier.
    pub async fn add(&self, draft: K::Draft, user_id: &UserId) -> Result<DocumentId, Error> {
        K::validate(&draft)?;
        let store = self.store("add")?;
        let fields = K::draft_fields(draft, user_id, self.now());
        let id = store
            .create(K::COLLECTION, fields)
            .await
            .map_err(|err| Self::map_store_error("add", err))?;
        debug!(collection = K::COLLECTION, %id, user_id = %user_id, "entity created");
        Ok(id)
    }

    /// List every entity owned by `user_id` in the kind's order.
    pub async fn get_all(&self, user_id: &UserId) -> Result<Vec<K::Entity>, Error> {
        self.list(&K::list_query(user_id), user_id).await
    }

    pub(crate) async fn list(
        &self,
        query: &DocumentQuery,
        user_id: &UserId,
    ) -> Result<Vec<K::Entity>, Error> {
        let Some(store) = self.store.as_deref() else {
            warn!(collection = K::COLLECTION, "backend not configured; returning no entities");
            return Ok(Vec::new());
        };
        let documents = store
            .query(query)
            .await
            .map_err(|err| Self::map_store_error("fetch", err))?;
        let now = self.now();
        let mut entities = Vec::with_capacity(documents.len());
        for document in &documents {
            let entity = K::decode(document, now).map_err(|err| {
                Error::backend_failure(format!(
                    "failed to decode {} {}: {err}",
                    K::LABEL,
                    document.id()
                ))
                .with_details(json!({
                    "collection": K::COLLECTION,
                    "id": document.id().as_ref(),
                }))
            })?;
            if K::owner(&entity) != user_id {
                warn!(
                    collection = K::COLLECTION,
                    id = %document.id(),
                    "dropping document owned by another user"
                );
                continue;
            }
            entities.push(entity);
        }
        K::sort(&mut entities);
        debug!(collection = K::COLLECTION, count = entities.len(), "entities listed");
        Ok(entities)
    }

    /// Merge the supplied fields into `id`, always stamping `updatedAt`.
    pub async fn update(&self, id: &DocumentId, patch: K::Patch) -> Result<(), Error> {
        K::validate_patch(&patch)?;
        let store = self.store("update")?;
        let mut fields = K::patch_fields(patch);
        fields.insert(UPDATED_AT_FIELD.to_owned(), FieldValue::from(self.now()));
        store
            .patch(K::COLLECTION, id, fields)
            .await
            .map_err(|err| Self::map_store_error("update", err))?;
        debug!(collection = K::COLLECTION, %id, "entity updated");
        Ok(())
    }

    /// Remove `id`. Entities referencing it are left untouched.
    pub async fn delete(&self, id: &DocumentId) -> Result<(), Error> {
        let store = self.store("delete")?;
        store
            .remove(K::COLLECTION, id)
            .await
            .map_err(|err| Self::map_store_error("delete", err))?;
        debug!(collection = K::COLLECTION, %id, "entity deleted");
        Ok(())
    }

    pub(crate) fn map_store_error(operation: &str, error: DocumentStoreError) -> Error {
        let label = K::LABEL;
        match error {
            DocumentStoreError::Unavailable { message } => {
                Error::backend_unavailable(format!("failed to {operation} {label}: {message}"))
            }
            DocumentStoreError::PermissionDenied { message } => {
                Error::forbidden(format!("failed to {operation} {label}: {message}"))
            }
            DocumentStoreError::NotFound { collection, id } => {
                Error::not_found(format!("failed to {operation} {label}: {id} does not exist"))
                    .with_details(json!({ "collection": collection, "id": id }))
            }
            DocumentStoreError::Rejected { message } => {
                Error::backend_failure(format!("failed to {operation} {label}: {message}"))
            }
        }
    }
}

#[cfg(test)]
#[path = "entity_service_tests.rs"]
mod tests;
