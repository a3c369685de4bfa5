//! Authentication primitives such as login credentials.
//!
//! Credentials are validated before the auth store talks to the identity
//! provider port, so a blank form never reaches the backend.

use thiserror::Error;
use zeroize::Zeroizing;

/// Reasons a login form is rejected before reaching the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email is required")]
    EmptyEmail,
    /// Password was empty.
    #[error("password is required")]
    EmptyPassword,
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and non-empty.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use my_money::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada@example.com ", "secret")?;
/// assert_eq!(creds.email(), "ada@example.com");
/// assert_eq!(creds.password(), "secret");
/// # Ok::<(), my_money::domain::LoginValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Validate raw form input. The email is trimmed; the password is
    /// kept verbatim.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        match (email.trim(), password) {
            ("", _) => Err(LoginValidationError::EmptyEmail),
            (_, "") => Err(LoginValidationError::EmptyPassword),
            (trimmed, secret) => Ok(Self {
                email: trimmed.to_owned(),
                password: Zeroizing::new(secret.to_owned()),
            }),
        }
    }

    /// Trimmed email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Password exactly as entered.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}
