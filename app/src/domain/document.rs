//! Document model shared by the document store port and the entity codecs.
//!
//! Documents are flat maps of typed [`FieldValue`]s keyed by field name. The
//! value set mirrors what the hosted store can hold for this app: scalars,
//! strings and timestamps. Timestamps are the backend's instant
//! representation; entity codecs convert them to `DateTime<Utc>` on read.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::UserId;

/// Field holding the owning user's identifier on every entity document.
pub const USER_ID_FIELD: &str = "userId";
/// Field holding the creation instant.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Field holding the last-update instant.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Field map of a single document.
pub type Fields = BTreeMap<String, FieldValue>;

/// Typed document field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    /// Explicit null.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// Double precision number.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Backend timestamp.
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    const fn type_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::Integer(_) | Self::Double(_) => 2,
            Self::Timestamp(_) => 3,
            Self::String(_) => 4,
        }
    }

    /// Compare two values of the same kind.
    ///
    /// Integers and doubles compare numerically with each other. Values of
    /// different kinds are incomparable and yield `None`, so range filters
    /// never match across kinds.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "mixed numeric comparison")]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Double(a), Self::Double(b)) => Some(a.total_cmp(b)),
            (Self::Integer(a), Self::Double(b)) => Some((*a as f64).total_cmp(b)),
            (Self::Double(a), Self::Integer(b)) => Some(a.total_cmp(&(*b as f64))),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total ordering used for sorting: kinds first, then values.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.type_rank().cmp(&other.type_rank()))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<&UserId> for FieldValue {
    fn from(value: &UserId) -> Self {
        Self::String(value.as_ref().to_owned())
    }
}

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Validation errors returned by [`DocumentId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentIdError {
    /// The identifier was empty or whitespace.
    #[error("document id must not be empty")]
    Empty,
    /// The identifier contained a path separator.
    #[error("document id must not contain '/'")]
    ContainsSeparator,
}

/// Backend-assigned document identifier.
///
/// # Examples
/// ```
/// use my_money::domain::DocumentId;
///
/// let id = DocumentId::new("abc123").expect("valid id");
/// assert_eq!(id.to_string(), "abc123");
/// assert!(DocumentId::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate and construct a [`DocumentId`].
    pub fn new(id: impl Into<String>) -> Result<Self, DocumentIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DocumentIdError::Empty);
        }
        if id.contains('/') {
            return Err(DocumentIdError::ContainsSeparator);
        }
        Ok(Self(id))
    }
}

impl From<Uuid> for DocumentId {
    fn from(value: Uuid) -> Self {
        Self(value.simple().to_string())
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

impl TryFrom<String> for DocumentId {
    type Error = DocumentIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Errors raised while decoding a document into an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentDecodeError {
    /// A required field was absent or null.
    #[error("field `{field}` is missing")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
    /// A field held a value of the wrong kind.
    #[error("field `{field}` must be {expected}")]
    WrongType {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the expected kind.
        expected: &'static str,
    },
    /// A field held a value of the right kind that failed validation.
    #[error("field `{field}` is invalid: {message}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Validation message.
        message: String,
    },
}

/// Error returned when parsing an unknown enum label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariantError {
    kind: &'static str,
    value: String,
}

impl UnknownVariantError {
    /// Record an unrecognised `value` for the enum named `kind`.
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// A document read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: DocumentId,
    fields: Fields,
}

impl Document {
    /// Pair an identifier with its fields.
    #[must_use]
    pub const fn new(id: DocumentId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Document identifier.
    #[must_use]
    pub const fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Raw field map.
    #[must_use]
    pub const fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Field value, treating explicit nulls as absent.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .get(field)
            .filter(|value| !matches!(value, FieldValue::Null))
    }

    /// Required string field.
    pub fn string(&self, field: &'static str) -> Result<&str, DocumentDecodeError> {
        self.optional_string(field)?
            .ok_or(DocumentDecodeError::MissingField { field })
    }

    /// Optional string field.
    pub fn optional_string(&self, field: &'static str) -> Result<Option<&str>, DocumentDecodeError> {
        match self.get(field) {
            None => Ok(None),
            Some(FieldValue::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(DocumentDecodeError::WrongType {
                field,
                expected: "a string",
            }),
        }
    }

    /// Required numeric field; integers widen to `f64`.
    #[expect(clippy::cast_precision_loss, reason = "amounts are stored as doubles")]
    pub fn number(&self, field: &'static str) -> Result<f64, DocumentDecodeError> {
        match self.get(field) {
            None => Err(DocumentDecodeError::MissingField { field }),
            Some(FieldValue::Double(value)) => Ok(*value),
            Some(FieldValue::Integer(value)) => Ok(*value as f64),
            Some(_) => Err(DocumentDecodeError::WrongType {
                field,
                expected: "a number",
            }),
        }
    }

    /// Optional integer field.
    pub fn optional_integer(&self, field: &'static str) -> Result<Option<i64>, DocumentDecodeError> {
        match self.get(field) {
            None => Ok(None),
            Some(FieldValue::Integer(value)) => Ok(Some(*value)),
            Some(_) => Err(DocumentDecodeError::WrongType {
                field,
                expected: "an integer",
            }),
        }
    }

    /// Required boolean field.
    pub fn boolean(&self, field: &'static str) -> Result<bool, DocumentDecodeError> {
        match self.get(field) {
            None => Err(DocumentDecodeError::MissingField { field }),
            Some(FieldValue::Boolean(value)) => Ok(*value),
            Some(_) => Err(DocumentDecodeError::WrongType {
                field,
                expected: "a boolean",
            }),
        }
    }

    /// Optional timestamp field.
    pub fn optional_timestamp(
        &self,
        field: &'static str,
    ) -> Result<Option<DateTime<Utc>>, DocumentDecodeError> {
        match self.get(field) {
            None => Ok(None),
            Some(FieldValue::Timestamp(value)) => Ok(Some(*value)),
            Some(_) => Err(DocumentDecodeError::WrongType {
                field,
                expected: "a timestamp",
            }),
        }
    }

    /// Required string field parsed with [`FromStr`].
    pub fn parsed<T>(&self, field: &'static str) -> Result<T, DocumentDecodeError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional_parsed(field)?
            .ok_or(DocumentDecodeError::MissingField { field })
    }

    /// Optional string field parsed with [`FromStr`].
    pub fn optional_parsed<T>(&self, field: &'static str) -> Result<Option<T>, DocumentDecodeError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional_string(field)?
            .map(|raw| {
                raw.parse().map_err(|err: T::Err| DocumentDecodeError::InvalidValue {
                    field,
                    message: err.to_string(),
                })
            })
            .transpose()
    }

    /// Owning user identifier.
    pub fn user_id(&self) -> Result<UserId, DocumentDecodeError> {
        let raw = self.string(USER_ID_FIELD)?;
        UserId::new(raw).map_err(|err| DocumentDecodeError::InvalidValue {
            field: USER_ID_FIELD,
            message: err.to_string(),
        })
    }
}

/// Inclusive bound of a range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    /// Field value must be greater than or equal to the filter value.
    AtLeast,
    /// Field value must be less than or equal to the filter value.
    AtMost,
}

/// Sort direction for ordered reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Equality restriction on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityFilter {
    /// Field name.
    pub field: String,
    /// Required value.
    pub value: FieldValue,
}

/// Inclusive range restriction on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    /// Field name.
    pub field: String,
    /// Bound kind.
    pub bound: RangeBound,
    /// Bound value.
    pub value: FieldValue,
}

/// Ordering applied to query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field name.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

/// Collection query: equality filters, optional range filters and an
/// optional ordering.
///
/// # Examples
/// ```
/// use my_money::domain::{DocumentQuery, SortDirection};
///
/// let query = DocumentQuery::new("categories")
///     .where_eq("userId", "uid-1")
///     .order_by("name", SortDirection::Ascending);
/// assert_eq!(query.collection(), "categories");
/// assert_eq!(query.equality_filters().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    collection: String,
    equals: Vec<EqualityFilter>,
    ranges: Vec<RangeFilter>,
    order_by: Option<OrderBy>,
}

impl DocumentQuery {
    /// Start a query over `collection`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            equals: Vec::new(),
            ranges: Vec::new(),
            order_by: None,
        }
    }

    /// Require `field` to equal `value`.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.equals.push(EqualityFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Require `field` to be at least `value` (inclusive).
    #[must_use]
    pub fn where_at_least(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.ranges.push(RangeFilter {
            field: field.into(),
            bound: RangeBound::AtLeast,
            value: value.into(),
        });
        self
    }

    /// Require `field` to be at most `value` (inclusive).
    #[must_use]
    pub fn where_at_most(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.ranges.push(RangeFilter {
            field: field.into(),
            bound: RangeBound::AtMost,
            value: value.into(),
        });
        self
    }

    /// Order results by `field`.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Target collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }

    /// Equality filters in insertion order.
    #[must_use]
    pub fn equality_filters(&self) -> &[EqualityFilter] {
        &self.equals
    }

    /// Range filters in insertion order.
    #[must_use]
    pub fn range_filters(&self) -> &[RangeFilter] {
        &self.ranges
    }

    /// Requested ordering, if any.
    #[must_use]
    pub const fn ordering(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    /// Whether a document's fields satisfy every filter.
    ///
    /// Documents missing the ordering field are excluded, matching how the
    /// hosted store treats ordered reads.
    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        let equals = self
            .equals
            .iter()
            .all(|filter| fields.get(&filter.field) == Some(&filter.value));
        let ranges = self.ranges.iter().all(|filter| {
            let Some(ordering) = fields
                .get(&filter.field)
                .and_then(|actual| actual.compare(&filter.value))
            else {
                return false;
            };
            match filter.bound {
                RangeBound::AtLeast => ordering != Ordering::Less,
                RangeBound::AtMost => ordering != Ordering::Greater,
            }
        });
        let ordered = self
            .order_by
            .as_ref()
            .is_none_or(|order| fields.contains_key(&order.field));
        equals && ranges && ordered
    }

    /// Sort documents according to the requested ordering. Stable; a query
    /// without ordering leaves the slice untouched.
    pub fn sort(&self, documents: &mut [Document]) {
        let Some(order) = self.order_by.as_ref() else {
            return;
        };
        documents.sort_by(|left, right| {
            let ordering = match (left.fields.get(&order.field), right.fields.get(&order.field)) {
                (Some(a), Some(b)) => a.total_cmp(b),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            match order.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn doc(id: &str, fields: &[(&str, FieldValue)]) -> Document {
        let fields = fields
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect();
        Document::new(DocumentId::new(id).expect("valid id"), fields)
    }

    #[fixture]
    fn transaction_doc() -> Document {
        doc(
            "t1",
            &[
                ("userId", FieldValue::from("uid-1")),
                ("amount", FieldValue::Integer(12)),
                ("transactionDate", FieldValue::Timestamp(at(10))),
                ("note", FieldValue::Null),
            ],
        )
    }

    #[rstest]
    fn numbers_compare_across_integer_and_double() {
        let ordering = FieldValue::Integer(2).compare(&FieldValue::Double(2.5));
        assert_eq!(ordering, Some(Ordering::Less));
    }

    #[rstest]
    fn different_kinds_are_incomparable_but_totally_ordered() {
        let text = FieldValue::from("2025");
        let stamp = FieldValue::Timestamp(at(1));
        assert_eq!(text.compare(&stamp), None);
        assert_eq!(stamp.total_cmp(&text), Ordering::Less);
    }

    #[rstest]
    fn nulls_read_as_absent(transaction_doc: Document) {
        assert_eq!(transaction_doc.optional_string("note"), Ok(None));
        assert_eq!(
            transaction_doc.string("note"),
            Err(DocumentDecodeError::MissingField { field: "note" })
        );
    }

    #[rstest]
    fn integers_widen_to_numbers(transaction_doc: Document) {
        assert_eq!(transaction_doc.number("amount"), Ok(12.0));
    }

    #[rstest]
    fn wrong_kinds_are_reported(transaction_doc: Document) {
        assert_eq!(
            transaction_doc.boolean("amount"),
            Err(DocumentDecodeError::WrongType {
                field: "amount",
                expected: "a boolean",
            })
        );
    }

    #[rstest]
    #[case(Some(at(10)), None, true)]
    #[case(None, Some(at(10)), true)]
    #[case(Some(at(11)), None, false)]
    #[case(None, Some(at(9)), false)]
    #[case(Some(at(9)), Some(at(11)), true)]
    fn range_bounds_are_inclusive(
        transaction_doc: Document,
        #[case] start: Option<DateTime<Utc>>,
        #[case] end: Option<DateTime<Utc>>,
        #[case] expected: bool,
    ) {
        let mut query = DocumentQuery::new("transactions").where_eq("userId", "uid-1");
        if let Some(start) = start {
            query = query.where_at_least("transactionDate", start);
        }
        if let Some(end) = end {
            query = query.where_at_most("transactionDate", end);
        }
        assert_eq!(query.matches(transaction_doc.fields()), expected);
    }

    #[rstest]
    fn equality_filters_scope_by_value(transaction_doc: Document) {
        let query = DocumentQuery::new("transactions").where_eq("userId", "uid-2");
        assert!(!query.matches(transaction_doc.fields()));
    }

    #[rstest]
    fn ordering_excludes_documents_without_the_field(transaction_doc: Document) {
        let query = DocumentQuery::new("transactions").order_by("name", SortDirection::Ascending);
        assert!(!query.matches(transaction_doc.fields()));
    }

    #[rstest]
    fn sort_orders_descending() {
        let mut documents = vec![
            doc("a", &[("transactionDate", FieldValue::Timestamp(at(1)))]),
            doc("c", &[("transactionDate", FieldValue::Timestamp(at(3)))]),
            doc("b", &[("transactionDate", FieldValue::Timestamp(at(2)))]),
        ];
        DocumentQuery::new("transactions")
            .order_by("transactionDate", SortDirection::Descending)
            .sort(&mut documents);
        let ids: Vec<&str> = documents.iter().map(|d| d.id().as_ref()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[rstest]
    fn parse_failures_name_the_field() {
        let document = doc("d", &[("dueDate", FieldValue::from("not-a-date"))]);
        let result = document.parsed::<chrono::NaiveDate>("dueDate");
        assert!(matches!(
            result,
            Err(DocumentDecodeError::InvalidValue { field: "dueDate", .. })
        ));
    }

    #[rstest]
    fn optional_values_convert_to_null() {
        assert_eq!(FieldValue::from(None::<String>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(3_u8)), FieldValue::Integer(3));
    }
}
