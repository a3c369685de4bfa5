//! Budget line items.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity_service::{EntityKind, EntityService};
use crate::domain::{
    CREATED_AT_FIELD, Document, DocumentDecodeError, DocumentId, FieldValue, Fields,
    UPDATED_AT_FIELD, USER_ID_FIELD, UnknownVariantError, UserId,
};

const NAME_FIELD: &str = "name";
const TYPE_FIELD: &str = "type";
const AMOUNT_FIELD: &str = "amount";
const IS_RECURRENT_FIELD: &str = "isRecurrent";
const DUE_DAY_FIELD: &str = "dueDay";
const DUE_DATE_FIELD: &str = "dueDate";
const OWNER_FIELD: &str = "owner";
const PAYMENT_METHOD_FIELD: &str = "paymentMethod";
const CATEGORY_FIELD: &str = "category";

/// Whether a line item brings money in, spends it, or sets it aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetItemType {
    /// Money in.
    Income,
    /// Money out.
    Expense,
    /// Money set aside.
    Savings,
}

impl BudgetItemType {
    /// Stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Savings => "savings",
        }
    }
}

impl FromStr for BudgetItemType {
    type Err = UnknownVariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "savings" => Ok(Self::Savings),
            other => Err(UnknownVariantError::new("budget item type", other)),
        }
    }
}

impl fmt::Display for BudgetItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a line item is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    BankTransfer,
    Check,
    Other,
}

impl PaymentMethod {
    /// Stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::BankTransfer => "bank_transfer",
            Self::Check => "check",
            Self::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cash" => Ok(Self::Cash),
            "credit_card" => Ok(Self::CreditCard),
            "debit_card" => Ok(Self::DebitCard),
            "bank_transfer" => Ok(Self::BankTransfer),
            "check" => Ok(Self::Check),
            "other" => Ok(Self::Other),
            other => Err(UnknownVariantError::new("payment method", other)),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted budget line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    pub id: DocumentId,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: BudgetItemType,
    pub amount: f64,
    pub is_recurrent: bool,
    pub due_day: Option<u8>,
    pub due_date: Option<NaiveDate>,
    pub owner: String,
    pub payment_method: PaymentMethod,
    /// Identifier of the referenced category, if any.
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub user_id: UserId,
}

/// Input for creating a budget line item.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetItemDraft {
    pub name: String,
    pub item_type: BudgetItemType,
    pub amount: f64,
    pub is_recurrent: bool,
    pub due_day: Option<u8>,
    pub due_date: Option<NaiveDate>,
    pub owner: String,
    pub payment_method: PaymentMethod,
    pub category: Option<String>,
}

/// Partial update of a budget line item. `None` leaves a field unchanged;
/// `category: Some(None)` removes the category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetItemPatch {
    pub name: Option<String>,
    pub item_type: Option<BudgetItemType>,
    pub amount: Option<f64>,
    pub is_recurrent: Option<bool>,
    pub due_day: Option<u8>,
    pub due_date: Option<NaiveDate>,
    pub owner: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub category: Option<Option<String>>,
}

fn insert(fields: &mut Fields, name: &str, value: impl Into<FieldValue>) {
    fields.insert(name.to_owned(), value.into());
}

fn date_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// [`EntityKind`] for the `budgetItems` collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetItems;

impl EntityKind for BudgetItems {
    type Entity = BudgetItem;
    type Draft = BudgetItemDraft;
    type Patch = BudgetItemPatch;

    const COLLECTION: &'static str = "budgetItems";
    const LABEL: &'static str = "budget item";

    fn draft_fields(draft: BudgetItemDraft, user_id: &UserId, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        insert(&mut fields, NAME_FIELD, draft.name);
        insert(&mut fields, TYPE_FIELD, draft.item_type.as_str());
        insert(&mut fields, AMOUNT_FIELD, draft.amount);
        insert(&mut fields, IS_RECURRENT_FIELD, draft.is_recurrent);
        insert(&mut fields, OWNER_FIELD, draft.owner);
        insert(&mut fields, PAYMENT_METHOD_FIELD, draft.payment_method.as_str());
        if let Some(day) = draft.due_day {
            insert(&mut fields, DUE_DAY_FIELD, day);
        }
        if let Some(date) = draft.due_date {
            insert(&mut fields, DUE_DATE_FIELD, date_label(date));
        }
        if let Some(category) = draft.category {
            insert(&mut fields, CATEGORY_FIELD, category);
        }
        insert(&mut fields, USER_ID_FIELD, user_id);
        insert(&mut fields, CREATED_AT_FIELD, now);
        fields
    }

    fn patch_fields(patch: BudgetItemPatch) -> Fields {
        let mut fields = Fields::new();
        if let Some(name) = patch.name {
            insert(&mut fields, NAME_FIELD, name);
        }
        if let Some(item_type) = patch.item_type {
            insert(&mut fields, TYPE_FIELD, item_type.as_str());
        }
        if let Some(amount) = patch.amount {
            insert(&mut fields, AMOUNT_FIELD, amount);
        }
        if let Some(is_recurrent) = patch.is_recurrent {
            insert(&mut fields, IS_RECURRENT_FIELD, is_recurrent);
        }
        if let Some(day) = patch.due_day {
            insert(&mut fields, DUE_DAY_FIELD, day);
        }
        if let Some(date) = patch.due_date {
            insert(&mut fields, DUE_DATE_FIELD, date_label(date));
        }
        if let Some(owner) = patch.owner {
            insert(&mut fields, OWNER_FIELD, owner);
        }
        if let Some(method) = patch.payment_method {
            insert(&mut fields, PAYMENT_METHOD_FIELD, method.as_str());
        }
        if let Some(category) = patch.category {
            insert(&mut fields, CATEGORY_FIELD, category);
        }
        fields
    }

    fn decode(document: &Document, now: DateTime<Utc>) -> Result<BudgetItem, DocumentDecodeError> {
        let due_day = document
            .optional_integer(DUE_DAY_FIELD)?
            .map(|day| {
                u8::try_from(day).map_err(|_| DocumentDecodeError::InvalidValue {
                    field: DUE_DAY_FIELD,
                    message: format!("{day} is not a day of the month"),
                })
            })
            .transpose()?;
        Ok(BudgetItem {
            id: document.id().clone(),
            name: document.string(NAME_FIELD)?.to_owned(),
            item_type: document.parsed(TYPE_FIELD)?,
            amount: document.number(AMOUNT_FIELD)?,
            is_recurrent: document.boolean(IS_RECURRENT_FIELD)?,
            due_day,
            due_date: document.optional_parsed(DUE_DATE_FIELD)?,
            owner: document.string(OWNER_FIELD)?.to_owned(),
            payment_method: document.parsed(PAYMENT_METHOD_FIELD)?,
            category: document.optional_string(CATEGORY_FIELD)?.map(str::to_owned),
            created_at: document.optional_timestamp(CREATED_AT_FIELD)?.unwrap_or(now),
            updated_at: document.optional_timestamp(UPDATED_AT_FIELD)?,
            user_id: document.user_id()?,
        })
    }

    fn owner(entity: &BudgetItem) -> &UserId {
        &entity.user_id
    }

    fn sort(entities: &mut [BudgetItem]) {
        entities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

/// Entity access service for budget line items.
pub type BudgetService<D> = EntityService<BudgetItems, D>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn user_id() -> UserId {
        UserId::new("uid-1").expect("valid id")
    }

    #[fixture]
    fn draft() -> BudgetItemDraft {
        BudgetItemDraft {
            name: "Rent".to_owned(),
            item_type: BudgetItemType::Expense,
            amount: 1200.0,
            is_recurrent: true,
            due_day: Some(1),
            due_date: None,
            owner: "Ada".to_owned(),
            payment_method: PaymentMethod::BankTransfer,
            category: None,
        }
    }

    #[rstest]
    fn draft_fields_stamp_owner_and_creation(draft: BudgetItemDraft, user_id: UserId) {
        let fields = BudgetItems::draft_fields(draft, &user_id, now());
        assert_eq!(fields.get(USER_ID_FIELD), Some(&FieldValue::from("uid-1")));
        assert_eq!(fields.get(CREATED_AT_FIELD), Some(&FieldValue::Timestamp(now())));
        assert_eq!(fields.get(TYPE_FIELD), Some(&FieldValue::from("expense")));
        assert_eq!(
            fields.get(PAYMENT_METHOD_FIELD),
            Some(&FieldValue::from("bank_transfer"))
        );
        assert_eq!(fields.get(DUE_DAY_FIELD), Some(&FieldValue::Integer(1)));
        assert!(!fields.contains_key(UPDATED_AT_FIELD));
        assert!(!fields.contains_key(DUE_DATE_FIELD));
    }

    #[rstest]
    fn decode_restores_the_draft(draft: BudgetItemDraft, user_id: UserId) {
        let mut with_date = draft;
        with_date.due_date = NaiveDate::from_ymd_opt(2025, 3, 31);
        let fields = BudgetItems::draft_fields(with_date.clone(), &user_id, now());
        let document = Document::new(DocumentId::new("b1").expect("valid id"), fields);

        let item = BudgetItems::decode(&document, now()).expect("decodes");
        assert_eq!(item.name, with_date.name);
        assert_eq!(item.due_date, with_date.due_date);
        assert_eq!(item.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(item.created_at, now());
        assert_eq!(item.updated_at, None);
    }

    #[rstest]
    fn decode_rejects_unknown_labels(draft: BudgetItemDraft, user_id: UserId) {
        let mut fields = BudgetItems::draft_fields(draft, &user_id, now());
        fields.insert(TYPE_FIELD.to_owned(), FieldValue::from("gift"));
        let document = Document::new(DocumentId::new("b1").expect("valid id"), fields);

        let err = BudgetItems::decode(&document, now()).expect_err("unknown type");
        assert_eq!(
            err,
            DocumentDecodeError::InvalidValue {
                field: TYPE_FIELD,
                message: "unknown budget item type `gift`".to_owned(),
            }
        );
    }

    #[rstest]
    fn empty_patch_encodes_nothing() {
        assert!(BudgetItems::patch_fields(BudgetItemPatch::default()).is_empty());
    }

    #[rstest]
    fn sort_puts_newest_first(draft: BudgetItemDraft, user_id: UserId) {
        let mut items: Vec<BudgetItem> = (0..3)
            .map(|offset| {
                let created = now() + Duration::hours(offset);
                let fields = BudgetItems::draft_fields(draft.clone(), &user_id, created);
                let id = DocumentId::new(format!("b{offset}")).expect("valid id");
                BudgetItems::decode(&Document::new(id, fields), now()).expect("decodes")
            })
            .collect();
        BudgetItems::sort(&mut items);
        let ids: Vec<&str> = items.iter().map(|item| item.id.as_ref()).collect();
        assert_eq!(ids, ["b2", "b1", "b0"]);
    }

    #[rstest]
    #[case("cash", PaymentMethod::Cash)]
    #[case("credit_card", PaymentMethod::CreditCard)]
    #[case("check", PaymentMethod::Check)]
    fn payment_methods_parse_stored_labels(#[case] raw: &str, #[case] expected: PaymentMethod) {
        assert_eq!(raw.parse::<PaymentMethod>(), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }

    #[rstest]
    fn patch_can_remove_the_category() {
        let cleared = BudgetItems::patch_fields(BudgetItemPatch {
            category: Some(None),
            ..BudgetItemPatch::default()
        });
        assert_eq!(cleared.get(CATEGORY_FIELD), Some(&FieldValue::Null));

        let untouched = BudgetItems::patch_fields(BudgetItemPatch::default());
        assert!(!untouched.contains_key(CATEGORY_FIELD));
    }
}
