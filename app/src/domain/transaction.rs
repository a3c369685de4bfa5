//! Recorded income and expense transactions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity_service::{EntityKind, EntityService};
use crate::domain::ports::DocumentStore;
use crate::domain::{
    CREATED_AT_FIELD, Document, DocumentDecodeError, DocumentId, DocumentQuery, Error, FieldValue,
    Fields, SortDirection, UPDATED_AT_FIELD, USER_ID_FIELD, UnknownVariantError, UserId,
};

const DESCRIPTION_FIELD: &str = "description";
const AMOUNT_FIELD: &str = "amount";
const TRANSACTION_DATE_FIELD: &str = "transactionDate";
const TYPE_FIELD: &str = "type";
const CATEGORY_ID_FIELD: &str = "categoryId";
const BUDGET_ITEM_ID_FIELD: &str = "budgetItemId";
const OWNER_FIELD: &str = "owner";
const REGISTRATION_DATE_FIELD: &str = "registrationDate";

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = UnknownVariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(UnknownVariantError::new("transaction type", other)),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted transaction.
///
/// `transaction_date` and `registration_date` read as the current instant
/// when the stored document lacks them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: DocumentId,
    pub description: String,
    pub amount: f64,
    pub transaction_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category_id: Option<String>,
    pub budget_item_id: Option<String>,
    pub owner: String,
    pub registration_date: DateTime<Utc>,
    pub user_id: UserId,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for recording a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub description: String,
    pub amount: f64,
    pub transaction_date: DateTime<Utc>,
    pub transaction_type: TransactionType,
    pub category_id: Option<String>,
    pub budget_item_id: Option<String>,
    pub owner: String,
    pub registration_date: DateTime<Utc>,
}

/// Partial update of a transaction. `None` leaves a field unchanged.
///
/// The reference fields take `Some(None)` to detach the transaction from
/// its category or budget item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<Option<String>>,
    pub budget_item_id: Option<Option<String>>,
    pub owner: Option<String>,
    pub registration_date: Option<DateTime<Utc>>,
}

/// Inclusive bounds on `transactionDate`; either end may be open.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use my_money::domain::DateRange;
///
/// let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let range = DateRange::starting_at(start);
/// assert_eq!(range.start(), Some(start));
/// assert_eq!(range.end(), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Unbounded range.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Range bounded on both ends.
    #[must_use]
    pub const fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Range starting at `start`.
    #[must_use]
    pub const fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Range ending at `end`.
    #[must_use]
    pub const fn ending_at(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    #[must_use]
    pub const fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    fn apply(self, mut query: DocumentQuery) -> DocumentQuery {
        if let Some(start) = self.start {
            query = query.where_at_least(TRANSACTION_DATE_FIELD, start);
        }
        if let Some(end) = self.end {
            query = query.where_at_most(TRANSACTION_DATE_FIELD, end);
        }
        query
    }
}

fn set(fields: &mut Fields, name: &str, value: Option<impl Into<FieldValue>>) {
    if let Some(value) = value {
        fields.insert(name.to_owned(), value.into());
    }
}

/// [`EntityKind`] for the `transactions` collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transactions;

impl EntityKind for Transactions {
    type Entity = Transaction;
    type Draft = TransactionDraft;
    type Patch = TransactionPatch;

    const COLLECTION: &'static str = "transactions";
    const LABEL: &'static str = "transaction";

    fn draft_fields(draft: TransactionDraft, user_id: &UserId, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::from([
            (DESCRIPTION_FIELD.to_owned(), FieldValue::from(draft.description)),
            (AMOUNT_FIELD.to_owned(), FieldValue::from(draft.amount)),
            (
                TRANSACTION_DATE_FIELD.to_owned(),
                FieldValue::from(draft.transaction_date),
            ),
            (
                TYPE_FIELD.to_owned(),
                FieldValue::from(draft.transaction_type.as_str()),
            ),
            (OWNER_FIELD.to_owned(), FieldValue::from(draft.owner)),
            (
                REGISTRATION_DATE_FIELD.to_owned(),
                FieldValue::from(draft.registration_date),
            ),
            (USER_ID_FIELD.to_owned(), FieldValue::from(user_id)),
            (CREATED_AT_FIELD.to_owned(), FieldValue::from(now)),
            (UPDATED_AT_FIELD.to_owned(), FieldValue::from(now)),
        ]);
        set(&mut fields, CATEGORY_ID_FIELD, draft.category_id);
        set(&mut fields, BUDGET_ITEM_ID_FIELD, draft.budget_item_id);
        fields
    }

    fn patch_fields(patch: TransactionPatch) -> Fields {
        let mut fields = Fields::new();
        set(&mut fields, DESCRIPTION_FIELD, patch.description);
        set(&mut fields, AMOUNT_FIELD, patch.amount);
        set(&mut fields, TRANSACTION_DATE_FIELD, patch.transaction_date);
        set(
            &mut fields,
            TYPE_FIELD,
            patch.transaction_type.map(TransactionType::as_str),
        );
        set(&mut fields, CATEGORY_ID_FIELD, patch.category_id);
        set(&mut fields, BUDGET_ITEM_ID_FIELD, patch.budget_item_id);
        set(&mut fields, OWNER_FIELD, patch.owner);
        set(&mut fields, REGISTRATION_DATE_FIELD, patch.registration_date);
        fields
    }

    fn decode(document: &Document, now: DateTime<Utc>) -> Result<Transaction, DocumentDecodeError> {
        Ok(Transaction {
            id: document.id().clone(),
            description: document.string(DESCRIPTION_FIELD)?.to_owned(),
            amount: document.number(AMOUNT_FIELD)?,
            transaction_date: document
                .optional_timestamp(TRANSACTION_DATE_FIELD)?
                .unwrap_or(now),
            transaction_type: document.parsed(TYPE_FIELD)?,
            category_id: document.optional_string(CATEGORY_ID_FIELD)?.map(str::to_owned),
            budget_item_id: document
                .optional_string(BUDGET_ITEM_ID_FIELD)?
                .map(str::to_owned),
            owner: document.string(OWNER_FIELD)?.to_owned(),
            registration_date: document
                .optional_timestamp(REGISTRATION_DATE_FIELD)?
                .unwrap_or(now),
            user_id: document.user_id()?,
            created_at: document.optional_timestamp(CREATED_AT_FIELD)?,
            updated_at: document.optional_timestamp(UPDATED_AT_FIELD)?,
        })
    }

    fn owner(entity: &Transaction) -> &UserId {
        &entity.user_id
    }

    fn list_query(user_id: &UserId) -> DocumentQuery {
        DocumentQuery::new(Self::COLLECTION)
            .where_eq(USER_ID_FIELD, user_id)
            .order_by(TRANSACTION_DATE_FIELD, SortDirection::Descending)
    }
}

/// Entity access service for transactions.
pub type TransactionService<D> = EntityService<Transactions, D>;

impl<D> EntityService<Transactions, D>
where
    D: DocumentStore,
{
    /// List `user_id`'s transactions whose date falls within `range`,
    /// newest first.
    pub async fn get_all_in_range(
        &self,
        user_id: &UserId,
        range: DateRange,
    ) -> Result<Vec<Transaction>, Error> {
        let query = range.apply(Transactions::list_query(user_id));
        self.list(&query, user_id).await
    }
}
