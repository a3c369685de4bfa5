//! User identity and session model.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons [`UserId::new`] rejects an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UserValidationError {
    /// Blank identifier.
    #[error("user id is blank")]
    EmptyId,
    /// Leading or trailing whitespace.
    #[error("user id has surrounding whitespace")]
    PaddedId,
}

/// Opaque user identifier assigned by the identity provider.
///
/// Every entity document carries the owning [`UserId`]; all reads are
/// scoped by equality on it.
///
/// # Examples
/// ```
/// use my_money::domain::UserId;
///
/// let id = UserId::new("uid-42").expect("valid id");
/// assert_eq!(id.as_ref(), "uid-42");
/// assert!(UserId::new(" uid ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = id.into();
        match raw.trim() {
            "" => Err(UserValidationError::EmptyId),
            trimmed if trimmed.len() != raw.len() => Err(UserValidationError::PaddedId),
            _ => Ok(Self(raw)),
        }
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

/// Authenticated session reported by the identity provider.
///
/// ## Invariants
/// - `display_name` is never an empty string; blank names collapse to
///   `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    user_id: UserId,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

impl Session {
    /// Build a session for `user_id` signed in as `email`.
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            display_name: None,
        }
    }

    /// Attach a display name; blank names are dropped.
    #[must_use]
    pub fn with_display_name(self, name: impl Into<String>) -> Self {
        let candidate: String = name.into();
        Self {
            display_name: (!candidate.trim().is_empty()).then_some(candidate),
            ..self
        }
    }

    /// Identifier of the signed-in user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Email address used to sign in. May be empty when the provider does
    /// not expose one.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Optional display name.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}
