//! Directory user data model.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The email address was empty.
    #[error("email address must not be empty")]
    EmptyEmail,
    /// The email address has surrounding whitespace or no `local@domain` shape.
    #[error("email address must look like local@domain")]
    InvalidEmail,
    /// The display name was blank.
    #[error("display name must not be empty")]
    EmptyDisplayName,
    /// The display name exceeds the stored column width.
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Stable directory identifier (serial primary key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    /// Wrap a raw database identifier.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw database identifier.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^@\s]+@[^@\s]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Primary email address; the directory's natural key.
///
/// Emails are compared exactly as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    ///
    /// # Examples
    /// ```
    /// use ecobin::domain::EmailAddress;
    ///
    /// assert!(EmailAddress::new("ada@example.com").is_ok());
    /// assert!(EmailAddress::new("not-an-email").is_err());
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        if email.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if email.trim() != email || !email_regex().is_match(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Maximum stored length for a display name.
pub const DISPLAY_NAME_MAX: usize = 255;

/// Name recorded when the identity provider supplies none.
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous User";

/// Human readable name stored alongside the directory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`].
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(display_name.into())
    }

    /// The placeholder name used for identities without any name.
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_DISPLAY_NAME.to_owned())
    }

    fn from_owned(display_name: String) -> Result<Self, UserValidationError> {
        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if display_name.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(display_name))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Internal user record keyed by email.
///
/// ## Invariants
/// - At most one record exists per email; the directory enforces this with
///   a uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    id: UserId,
    email: EmailAddress,
    name: DisplayName,
    created_at: DateTime<Utc>,
}

impl DirectoryUser {
    /// Build a directory user from validated components.
    pub fn new(
        id: UserId,
        email: EmailAddress,
        name: DisplayName,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name,
            created_at,
        }
    }

    /// Directory identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Primary email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Stored display name.
    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    //! Validation coverage for user value types.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyEmail)]
    #[case(" ada@example.com", UserValidationError::InvalidEmail)]
    #[case("ada.example.com", UserValidationError::InvalidEmail)]
    #[case("ada@@example.com", UserValidationError::InvalidEmail)]
    #[case("ada lovelace@example.com", UserValidationError::InvalidEmail)]
    fn rejects_malformed_emails(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(EmailAddress::new(raw), Err(expected));
    }

    #[rstest]
    fn email_keeps_original_casing() {
        let email = EmailAddress::new("Ada@Example.com").expect("valid email");
        assert_eq!(email.as_ref(), "Ada@Example.com");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn rejects_blank_display_names(#[case] raw: &str) {
        assert_eq!(
            DisplayName::new(raw),
            Err(UserValidationError::EmptyDisplayName)
        );
    }

    #[rstest]
    fn accepts_names_with_punctuation() {
        let name = DisplayName::new("Siobhán O'Neil-Ng").expect("valid name");
        assert_eq!(name.as_ref(), "Siobhán O'Neil-Ng");
    }

    #[rstest]
    fn rejects_overlong_display_names() {
        let raw = "x".repeat(DISPLAY_NAME_MAX + 1);
        assert_eq!(
            DisplayName::new(raw),
            Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX
            })
        );
    }

    #[rstest]
    fn email_deserialisation_validates() {
        let ok: Result<EmailAddress, _> = serde_json::from_str("\"ada@example.com\"");
        let bad: Result<EmailAddress, _> = serde_json::from_str("\"nope\"");
        assert!(ok.is_ok());
        assert!(bad.is_err());
    }
}
