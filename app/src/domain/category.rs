//! Spending categories and the default catalogue seeded for new users.

use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::entity_service::{EntityKind, EntityService};
use crate::domain::ports::DocumentStore;
use crate::domain::{
    CREATED_AT_FIELD, Document, DocumentDecodeError, DocumentId, DocumentQuery, Error, FieldValue,
    Fields, SortDirection, UPDATED_AT_FIELD, USER_ID_FIELD, UserId,
};

const NAME_FIELD: &str = "name";
const COLOR_FIELD: &str = "color";
const ICON_FIELD: &str = "icon";

/// Default catalogue as `(name, colour, icon)`, in seeding order.
const DEFAULT_CATEGORIES: [(&str, &str, &str); 10] = [
    ("Food & Dining", "#FF6B6B", "🍽️"),
    ("Transportation", "#4ECDC4", "🚗"),
    ("Shopping", "#45B7D1", "🛍️"),
    ("Entertainment", "#96CEB4", "🎬"),
    ("Bills & Utilities", "#FFEAA7", "⚡"),
    ("Healthcare", "#DDA0DD", "🏥"),
    ("Education", "#98D8C8", "📚"),
    ("Travel", "#F7DC6F", "✈️"),
    ("Salary", "#82E0AA", "💰"),
    ("Investment", "#85C1E9", "📈"),
];

/// A persisted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: DocumentId,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl CategoryDraft {
    /// Build a draft from its parts.
    pub fn new(name: impl Into<String>, color: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
        }
    }
}

/// Partial update of a category. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Outcome of [`CategoryService::initialize_default_categories`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySeeding {
    /// The user had no categories; `created` defaults were written. Fewer
    /// than ten means a concurrent session wrote the rest.
    Seeded { created: usize },
    /// The user already had categories; nothing was written.
    AlreadyPresent { existing: usize },
    /// The backend is not configured.
    Skipped,
}

fn require_name(name: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::invalid_request("category name is required"));
    }
    Ok(())
}

/// [`EntityKind`] for the `categories` collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Categories;

impl EntityKind for Categories {
    type Entity = Category;
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;

    const COLLECTION: &'static str = "categories";
    const LABEL: &'static str = "category";

    fn validate(draft: &CategoryDraft) -> Result<(), Error> {
        require_name(&draft.name)
    }

    fn validate_patch(patch: &CategoryPatch) -> Result<(), Error> {
        patch.name.as_deref().map_or(Ok(()), require_name)
    }

    fn draft_fields(draft: CategoryDraft, user_id: &UserId, now: DateTime<Utc>) -> Fields {
        Fields::from([
            (NAME_FIELD.to_owned(), FieldValue::from(draft.name)),
            (COLOR_FIELD.to_owned(), FieldValue::from(draft.color)),
            (ICON_FIELD.to_owned(), FieldValue::from(draft.icon)),
            (USER_ID_FIELD.to_owned(), FieldValue::from(user_id)),
            (CREATED_AT_FIELD.to_owned(), FieldValue::from(now)),
            (UPDATED_AT_FIELD.to_owned(), FieldValue::from(now)),
        ])
    }

    fn patch_fields(patch: CategoryPatch) -> Fields {
        [
            (NAME_FIELD, patch.name),
            (COLOR_FIELD, patch.color),
            (ICON_FIELD, patch.icon),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field.to_owned(), FieldValue::from(value))))
        .collect()
    }

    fn decode(document: &Document, now: DateTime<Utc>) -> Result<Category, DocumentDecodeError> {
        let created_at = document.optional_timestamp(CREATED_AT_FIELD)?.unwrap_or(now);
        Ok(Category {
            id: document.id().clone(),
            name: document.string(NAME_FIELD)?.to_owned(),
            color: document.string(COLOR_FIELD)?.to_owned(),
            icon: document.string(ICON_FIELD)?.to_owned(),
            user_id: document.user_id()?,
            created_at,
            updated_at: document
                .optional_timestamp(UPDATED_AT_FIELD)?
                .unwrap_or(created_at),
        })
    }

    fn owner(entity: &Category) -> &UserId {
        &entity.user_id
    }

    fn list_query(user_id: &UserId) -> DocumentQuery {
        DocumentQuery::new(Self::COLLECTION)
            .where_eq(USER_ID_FIELD, user_id)
            .order_by(NAME_FIELD, SortDirection::Ascending)
    }
}

/// Entity access service for categories.
pub type CategoryService<D> = EntityService<Categories, D>;

/// Deterministic identifier of the `index`th default category for a user.
///
/// Concurrent seeding from two sessions writes the same identifiers, so
/// the conditional create lets only one of them land.
fn default_category_id(user_id: &UserId, index: usize) -> Result<DocumentId, Error> {
    DocumentId::new(format!("{user_id}-default-{index:02}")).map_err(|err| {
        Error::invalid_request(format!("cannot derive default category id: {err}"))
    })
}

impl<D> EntityService<Categories, D>
where
    D: DocumentStore,
{
    /// The fixed ten-entry default catalogue.
    ///
    /// # Examples
    /// ```
    /// use my_money::domain::CategoryService;
    /// use my_money::outbound::InMemoryDocumentStore;
    ///
    /// let defaults = CategoryService::<InMemoryDocumentStore>::default_categories();
    /// assert_eq!(defaults.len(), 10);
    /// assert_eq!(defaults[0].name, "Food & Dining");
    /// ```
    #[must_use]
    pub fn default_categories() -> Vec<CategoryDraft> {
        DEFAULT_CATEGORIES
            .iter()
            .map(|(name, color, icon)| CategoryDraft::new(*name, *color, *icon))
            .collect()
    }

    /// Seed the default catalogue when `user_id` has no categories.
    ///
    /// Writes use deterministic identifiers and the store's conditional
    /// create, so repeated or concurrent calls converge on exactly one copy
    /// of each default.
    pub async fn initialize_default_categories(
        &self,
        user_id: &UserId,
    ) -> Result<CategorySeeding, Error> {
        if !self.is_available() {
            debug!(user_id = %user_id, "backend not configured; skipping category seeding");
            return Ok(CategorySeeding::Skipped);
        }

        let existing = self.get_all(user_id).await?;
        if !existing.is_empty() {
            return Ok(CategorySeeding::AlreadyPresent {
                existing: existing.len(),
            });
        }

        let store = self.store("seed")?;
        let now = self.now();
        let writes = Self::default_categories()
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                let fields = Categories::draft_fields(draft, user_id, now);
                async move {
                    let id = default_category_id(user_id, index)?;
                    store
                        .create_if_absent(Categories::COLLECTION, &id, fields)
                        .await
                        .map_err(|err| Self::map_store_error("seed", err))
                }
            });
        let created = try_join_all(writes)
            .await?
            .into_iter()
            .filter(|written| *written)
            .count();
        info!(user_id = %user_id, created, "default categories seeded");
        Ok(CategorySeeding::Seeded { created })
    }
}
