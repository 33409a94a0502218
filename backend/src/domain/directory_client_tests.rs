//! Tests for the directory client's create-if-absent contract.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use mockall::Sequence;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::UserId;
use crate::domain::ports::MockUserDirectory;

#[fixture]
fn email() -> EmailAddress {
    EmailAddress::new("ada@example.com").expect("valid email")
}

#[fixture]
fn name() -> DisplayName {
    DisplayName::new("Ada Lovelace").expect("valid name")
}

fn stored_user(email: &EmailAddress, name: &DisplayName) -> DirectoryUser {
    let created_at = Utc
        .with_ymd_and_hms(2026, 10, 1, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp");
    DirectoryUser::new(UserId::new(7), email.clone(), name.clone(), created_at)
}

#[rstest]
#[tokio::test]
async fn existing_user_is_returned_without_creation(email: EmailAddress, name: DisplayName) {
    let user = stored_user(&email, &name);
    let mut directory = MockUserDirectory::new();
    directory
        .expect_find_by_email()
        .times(1)
        .return_once(move |_| Ok(Some(user)));
    directory.expect_create().times(0);

    let client = UserDirectoryClient::new(Arc::new(directory));
    let resolved = client
        .ensure_exists(&email, &name)
        .await
        .expect("existing user");

    assert_eq!(resolved.id(), UserId::new(7));
}

#[rstest]
#[tokio::test]
async fn absent_user_is_created(email: EmailAddress, name: DisplayName) {
    let user = stored_user(&email, &name);
    let mut directory = MockUserDirectory::new();
    directory
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(None));
    directory
        .expect_create()
        .withf(|email, name| {
            email.to_string() == "ada@example.com" && name.to_string() == "Ada Lovelace"
        })
        .times(1)
        .return_once(move |_, _| Ok(user));

    let client = UserDirectoryClient::new(Arc::new(directory));
    let created = client
        .ensure_exists(&email, &name)
        .await
        .expect("created user");

    assert_eq!(created.email(), &email);
}

#[rstest]
#[tokio::test]
async fn duplicate_on_create_re_resolves_the_winner(email: EmailAddress, name: DisplayName) {
    let user = stored_user(&email, &name);
    let mut seq = Sequence::new();
    let mut directory = MockUserDirectory::new();
    directory
        .expect_find_by_email()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(None));
    directory
        .expect_create()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|email, _| Err(UserDirectoryError::duplicate(email.to_string())));
    directory
        .expect_find_by_email()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(user)));

    let client = UserDirectoryClient::new(Arc::new(directory));
    let resolved = client
        .ensure_exists(&email, &name)
        .await
        .expect("duplicate is benign");

    assert_eq!(resolved.id(), UserId::new(7));
}

#[rstest]
#[case(UserDirectoryError::connection("refused"))]
#[case(UserDirectoryError::query("syntax error"))]
#[tokio::test]
async fn other_create_failures_surface_as_unavailable(
    email: EmailAddress,
    name: DisplayName,
    #[case] failure: UserDirectoryError,
) {
    let mut directory = MockUserDirectory::new();
    directory
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(None));
    directory
        .expect_create()
        .times(1)
        .return_once(move |_, _| Err(failure));

    let client = UserDirectoryClient::new(Arc::new(directory));
    let error = client
        .ensure_exists(&email, &name)
        .await
        .expect_err("create failure");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn resolve_maps_lookup_failures(email: EmailAddress) {
    let mut directory = MockUserDirectory::new();
    directory
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Err(UserDirectoryError::connection("pool exhausted")));

    let client = UserDirectoryClient::new(Arc::new(directory));
    let error = client.resolve(&email).await.expect_err("lookup failure");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert!(error.message().contains("pool exhausted"));
}
