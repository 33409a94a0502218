//! Port abstraction for the user directory and its errors.
use async_trait::async_trait;

use crate::domain::{DirectoryUser, DisplayName, EmailAddress};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// A record with this email already exists (uniqueness violation).
        Duplicate { email: String } => "directory user already exists for {email}",
        /// Directory connection could not be established.
        Connection { message: String } => "user directory connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user directory query failed: {message}",
    }
}

/// Lookup and creation of directory users keyed by email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch the user registered under `email`, if any.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<DirectoryUser>, UserDirectoryError>;

    /// Insert a new user.
    ///
    /// Adapters must report a uniqueness violation on `email` as
    /// [`UserDirectoryError::Duplicate`].
    async fn create(
        &self,
        email: &EmailAddress,
        name: &DisplayName,
    ) -> Result<DirectoryUser, UserDirectoryError>;
}
