//! The one error type services and stores hand back to callers.
//!
//! Port errors are translated at the service boundary, so UI code only
//! ever branches on [`ErrorCode`] and shows [`Error::message`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error as ThisError;

/// Failure category, serialised in `snake_case`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Caller-supplied data failed validation.
    InvalidRequest,
    /// Authentication failed.
    Unauthorized,
    /// The backend refused access to the resource.
    Forbidden,
    /// The requested document does not exist.
    NotFound,
    /// The backend is not configured or cannot be reached.
    BackendUnavailable,
    /// The backend rejected the operation.
    BackendFailure,
}

impl ErrorCode {
    const fn generic_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::BackendUnavailable => "backend unavailable",
            Self::BackendFailure => "backend operation failed",
        }
    }
}

/// A categorised failure with a descriptive message such as
/// `failed to add category: quota exceeded`.
///
/// The message is never blank.
///
/// # Examples
/// ```
/// use my_money::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("failed to update budget item: b1 does not exist");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert!(err.to_string().starts_with("failed to update"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

macro_rules! code_constructors {
    ($($name:ident => $code:ident),+ $(,)?) => {
        $(
            #[doc = concat!("Shorthand for [`Error::new`] with [`ErrorCode::", stringify!($code), "`].")]
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ErrorCode::$code, message)
            }
        )+
    };
}

impl Error {
    /// Build an error. A blank message is replaced by a generic one for
    /// `code`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let raw: String = message.into();
        let message = if raw.trim().is_empty() {
            code.generic_message().to_owned()
        } else {
            raw
        };
        Self {
            code,
            message,
            details: None,
        }
    }

    code_constructors! {
        invalid_request => InvalidRequest,
        unauthorized => Unauthorized,
        forbidden => Forbidden,
        not_found => NotFound,
        backend_unavailable => BackendUnavailable,
        backend_failure => BackendFailure,
    }

    /// Failure category.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Message suitable for display.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured context, e.g. the collection and document involved.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured context.
    #[must_use]
    pub fn with_details(self, details: Value) -> Self {
        Self {
            details: Some(details),
            ..self
        }
    }
}
