//! Identity-to-directory resolution.
//!
//! The client wraps the [`UserDirectory`] port with the idempotent
//! create-if-absent contract the dashboard relies on: a uniqueness violation
//! during creation means another caller won the race, so the record is
//! re-read instead of failing.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{DirectoryUser, DisplayName, EmailAddress, Error};

fn map_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } | UserDirectoryError::Query { message } => {
            Error::service_unavailable(format!("directory unavailable: {message}"))
        }
        UserDirectoryError::Duplicate { email } => {
            Error::internal(format!("unexpected duplicate directory user for {email}"))
        }
    }
}

/// Resolves external identities to directory users.
#[derive(Clone)]
pub struct UserDirectoryClient {
    directory: Arc<dyn UserDirectory>,
}

impl UserDirectoryClient {
    /// Create a client over a directory adapter.
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Look up the user registered under `email`. No side effects.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::ServiceUnavailable`] when the
    /// directory cannot be queried.
    pub async fn resolve(&self, email: &EmailAddress) -> Result<Option<DirectoryUser>, Error> {
        self.directory
            .find_by_email(email)
            .await
            .map_err(map_directory_error)
    }

    /// Return the user for `email`, creating it with `display_name` if absent.
    ///
    /// Creation that loses a race to a concurrent creator is treated as
    /// success and the winner's record is returned.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::ServiceUnavailable`] when the
    /// directory fails for any reason other than a duplicate key. The failure
    /// is logged here; callers are expected to degrade silently.
    pub async fn ensure_exists(
        &self,
        email: &EmailAddress,
        display_name: &DisplayName,
    ) -> Result<DirectoryUser, Error> {
        let result = self.ensure_exists_inner(email, display_name).await;
        if let Err(error) = &result {
            warn!(email = %email, error = %error, "failed to ensure directory user");
        }
        result
    }

    async fn ensure_exists_inner(
        &self,
        email: &EmailAddress,
        display_name: &DisplayName,
    ) -> Result<DirectoryUser, Error> {
        if let Some(existing) = self.resolve(email).await? {
            return Ok(existing);
        }

        match self.directory.create(email, display_name).await {
            Ok(created) => {
                info!(user_id = %created.id(), email = %email, "created directory user");
                Ok(created)
            }
            Err(UserDirectoryError::Duplicate { .. }) => {
                debug!(email = %email, "directory user already exists, skipping creation");
                self.resolve(email).await?.ok_or_else(|| {
                    Error::service_unavailable(format!(
                        "directory unavailable: {email} reported as duplicate but not found"
                    ))
                })
            }
            Err(other) => Err(map_directory_error(other)),
        }
    }
}

#[cfg(test)]
#[path = "directory_client_tests.rs"]
mod tests;
