//! In-process document store adapter.
//!
//! Implements the full [`DocumentStore`] contract, including filtered and
//! ordered queries and an atomic conditional create, over nested maps
//! guarded by one mutex. Used for local runs and behaviour tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{DocumentStore, DocumentStoreError};
use crate::domain::{Document, DocumentId, DocumentQuery, Fields};

type Collection = BTreeMap<DocumentId, Fields>;

/// Document store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: Mutex<BTreeMap<String, Collection>>,
}

impl InMemoryDocumentStore {
    fn collections(&self) -> MutexGuard<'_, BTreeMap<String, Collection>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Read one document directly, bypassing query semantics.
    #[must_use]
    pub fn document(&self, collection: &str, id: &DocumentId) -> Option<Document> {
        self.collections()
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document::new(id.clone(), fields.clone()))
    }

    /// Number of documents in `collection`.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections().get(collection).map_or(0, BTreeMap::len)
    }

    /// Whether `collection` holds no documents.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Document>, DocumentStoreError> {
        let mut documents: Vec<Document> = self
            .collections()
            .get(query.collection())
            .map(|documents| {
                documents
                    .iter()
                    .filter(|(_, fields)| query.matches(fields))
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        query.sort(&mut documents);
        Ok(documents)
    }

    async fn create(
        &self,
        collection: &str,
        fields: Fields,
    ) -> Result<DocumentId, DocumentStoreError> {
        let id = DocumentId::from(Uuid::new_v4());
        self.collections()
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), fields);
        debug!(collection, %id, "document created");
        Ok(id)
    }

    async fn create_if_absent(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> Result<bool, DocumentStoreError> {
        let mut collections = self.collections();
        let documents = collections.entry(collection.to_owned()).or_default();
        if documents.contains_key(id) {
            return Ok(false);
        }
        documents.insert(id.clone(), fields);
        Ok(true)
    }

    async fn patch(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> Result<(), DocumentStoreError> {
        let mut collections = self.collections();
        let existing = collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| DocumentStoreError::not_found(collection, id.as_ref()))?;
        existing.extend(fields);
        Ok(())
    }

    async fn remove(&self, collection: &str, id: &DocumentId) -> Result<(), DocumentStoreError> {
        if let Some(documents) = self.collections().get_mut(collection) {
            documents.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldValue, SortDirection};
    use rstest::rstest;

    fn fields(owner: &str, name: &str) -> Fields {
        Fields::from([
            ("userId".to_owned(), FieldValue::from(owner)),
            ("name".to_owned(), FieldValue::from(name)),
        ])
    }

    #[rstest]
    #[tokio::test]
    async fn query_filters_and_orders() {
        let store = InMemoryDocumentStore::default();
        store.create("categories", fields("a", "Travel")).await.expect("create");
        store.create("categories", fields("b", "Bills")).await.expect("create");
        store.create("categories", fields("a", "Food")).await.expect("create");

        let query = DocumentQuery::new("categories")
            .where_eq("userId", "a")
            .order_by("name", SortDirection::Ascending);
        let names: Vec<String> = store
            .query(&query)
            .await
            .expect("query")
            .iter()
            .map(|doc| doc.string("name").expect("name").to_owned())
            .collect();
        assert_eq!(names, ["Food", "Travel"]);
    }

    #[rstest]
    #[tokio::test]
    async fn create_if_absent_writes_once() {
        let store = InMemoryDocumentStore::default();
        let id = DocumentId::new("fixed").expect("valid id");
        assert!(store.create_if_absent("c", &id, fields("a", "one")).await.expect("first"));
        assert!(!store.create_if_absent("c", &id, fields("a", "two")).await.expect("second"));

        let stored = store.document("c", &id).expect("stored");
        assert_eq!(stored.string("name"), Ok("one"));
    }

    #[rstest]
    #[tokio::test]
    async fn patch_merges_and_requires_existence() {
        let store = InMemoryDocumentStore::default();
        let id = store.create("c", fields("a", "one")).await.expect("create");
        let patch = Fields::from([("name".to_owned(), FieldValue::from("renamed"))]);
        store.patch("c", &id, patch.clone()).await.expect("patch");

        let stored = store.document("c", &id).expect("stored");
        assert_eq!(stored.string("name"), Ok("renamed"));
        assert_eq!(stored.string("userId"), Ok("a"));

        let missing = DocumentId::new("missing").expect("valid id");
        let err = store.patch("c", &missing, patch).await.expect_err("missing");
        assert_eq!(err, DocumentStoreError::not_found("c", "missing"));
    }

    #[rstest]
    #[tokio::test]
    async fn remove_is_unconditional() {
        let store = InMemoryDocumentStore::default();
        let id = store.create("c", fields("a", "one")).await.expect("create");
        store.remove("c", &id).await.expect("remove");
        store.remove("c", &id).await.expect("remove again");
        store.remove("other", &id).await.expect("unknown collection");
        assert!(store.is_empty("c"));
    }
}
