//! PostgreSQL-backed `UserDirectory` adapter.
//!
//! Uniqueness of `email` is enforced by the `users_email_key` constraint, so
//! concurrent creators race at the database and the loser receives
//! [`UserDirectoryError::Duplicate`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{DirectoryUser, DisplayName, EmailAddress, UserId};

use super::diesel_error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel implementation of [`UserDirectory`].
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    /// Create an adapter over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(error: &diesel::result::Error) -> UserDirectoryError {
    map_diesel_error(error, UserDirectoryError::query, UserDirectoryError::connection)
}

fn row_to_user(row: UserRow) -> Result<DirectoryUser, UserDirectoryError> {
    let email = EmailAddress::new(row.email)
        .map_err(|err| UserDirectoryError::query(format!("stored user {}: {err}", row.id)))?;
    let name = DisplayName::new(row.name)
        .map_err(|err| UserDirectoryError::query(format!("stored user {}: {err}", row.id)))?;
    Ok(DirectoryUser::new(
        UserId::new(row.id),
        email,
        name,
        row.created_at,
    ))
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<DirectoryUser>, UserDirectoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserDirectoryError::connection))?;

        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_error(&err))?;

        row.map(row_to_user).transpose()
    }

    async fn create(
        &self,
        email: &EmailAddress,
        name: &DisplayName,
    ) -> Result<DirectoryUser, UserDirectoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserDirectoryError::connection))?;

        let new_row = NewUserRow {
            email: email.as_ref(),
            name: name.as_ref(),
        };
        let row = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    debug!(email = %email, "directory user already exists");
                    UserDirectoryError::duplicate(email.to_string())
                } else {
                    map_error(&err)
                }
            })?;

        debug!(user_id = row.id, email = %email, "directory user created");
        row_to_user(row)
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage; SQL paths are exercised against PostgreSQL.

    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn row(email: &str, name: &str) -> UserRow {
        UserRow {
            id: 7,
            email: email.to_owned(),
            name: name.to_owned(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn converts_valid_rows() {
        let user = row_to_user(row("ada@example.com", "Ada Lovelace")).expect("valid row");

        assert_eq!(user.id(), UserId::new(7));
        assert_eq!(user.email().as_ref(), "ada@example.com");
        assert_eq!(user.name().as_ref(), "Ada Lovelace");
    }

    #[rstest]
    #[case("not-an-email", "Ada")]
    #[case("ada@example.com", "   ")]
    fn corrupt_rows_are_query_failures(#[case] email: &str, #[case] name: &str) {
        let error = row_to_user(row(email, name)).expect_err("invalid row");
        assert!(matches!(error, UserDirectoryError::Query { .. }));
    }
}
