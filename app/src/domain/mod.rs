//! Domain entities, entity access services and driven ports.
//!
//! Everything here is backend-agnostic: services reach persisted data only
//! through [`ports::DocumentStore`] and report failures as [`Error`].

pub mod auth;
pub mod budget;
pub mod category;
pub mod document;
pub mod entity_service;
pub mod error;
pub mod ports;
pub mod transaction;
pub mod user;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::budget::{
    BudgetItem, BudgetItemDraft, BudgetItemPatch, BudgetItemType, BudgetItems, BudgetService,
    PaymentMethod,
};
pub use self::category::{
    Categories, Category, CategoryDraft, CategoryPatch, CategorySeeding, CategoryService,
};
pub use self::document::{
    CREATED_AT_FIELD, Document, DocumentDecodeError, DocumentId, DocumentIdError, DocumentQuery,
    EqualityFilter, FieldValue, Fields, OrderBy, RangeBound, RangeFilter, SortDirection,
    UPDATED_AT_FIELD, USER_ID_FIELD, UnknownVariantError,
};
pub use self::entity_service::{EntityKind, EntityService};
pub use self::error::{Error, ErrorCode};
pub use self::transaction::{
    DateRange, Transaction, TransactionDraft, TransactionPatch, TransactionService,
    TransactionType, Transactions,
};
pub use self::user::{Session, UserId, UserValidationError};
