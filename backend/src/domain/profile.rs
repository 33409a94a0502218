//! Profile shown on the settings page.
//!
//! The directory record is preferred. When the directory cannot be reached
//! the profile is rebuilt from the identity alone and carries no creation
//! date.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::directory_client::UserDirectoryClient;
use super::{DisplayName, EmailAddress, IdentitySnapshot};

/// Label used for any field that has no value.
pub const NOT_AVAILABLE: &str = "Not available";

/// Where a profile's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    /// Directory record.
    Directory,
    /// Identity data only; the directory was unavailable.
    IdentityFallback,
}

/// Resolved profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Display name.
    pub name: DisplayName,
    /// Email, when the identity carries one.
    pub email: Option<EmailAddress>,
    /// Directory creation time.
    pub member_since: Option<DateTime<Utc>>,
    /// Data origin.
    pub source: ProfileSource,
}

impl Profile {
    /// Name label.
    pub fn name_label(&self) -> String {
        self.name.to_string()
    }

    /// Email label, or [`NOT_AVAILABLE`].
    pub fn email_label(&self) -> String {
        self.email
            .as_ref()
            .map_or_else(|| NOT_AVAILABLE.to_owned(), ToString::to_string)
    }

    /// `YYYY-MM-DD` creation date, or [`NOT_AVAILABLE`].
    pub fn member_since_label(&self) -> String {
        self.member_since.map_or_else(
            || NOT_AVAILABLE.to_owned(),
            |created_at| created_at.format("%Y-%m-%d").to_string(),
        )
    }
}

/// Settings page state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProfileView {
    /// Identity provider still loading.
    Loading,
    /// Nobody signed in.
    SignedOut,
    /// Profile resolved.
    Ready(Profile),
}

/// Loads the settings profile for an identity.
#[derive(Clone)]
pub struct ProfileLoader {
    directory: UserDirectoryClient,
}

impl ProfileLoader {
    /// Create a loader over a directory client.
    pub fn new(directory: UserDirectoryClient) -> Self {
        Self { directory }
    }

    /// Resolve the profile, creating the directory user when absent.
    pub async fn load(&self, snapshot: &IdentitySnapshot) -> ProfileView {
        if !snapshot.is_loaded {
            return ProfileView::Loading;
        }
        let Some(identity) = snapshot.user.as_ref() else {
            return ProfileView::SignedOut;
        };

        let name = identity.preferred_display_name();
        let fallback = || Profile {
            name: name.clone(),
            email: identity.primary_email.clone(),
            member_since: None,
            source: ProfileSource::IdentityFallback,
        };

        let Some(email) = identity.primary_email.as_ref() else {
            return ProfileView::Ready(fallback());
        };
        match self.directory.ensure_exists(email, &name).await {
            Ok(user) => ProfileView::Ready(Profile {
                name: user.name().clone(),
                email: Some(user.email().clone()),
                member_since: Some(user.created_at()),
                source: ProfileSource::Directory,
            }),
            Err(error) => {
                warn!(email = %email, error = %error, "showing identity profile without directory data");
                ProfileView::Ready(fallback())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Profile resolution and label formatting.

    use std::sync::Arc;

    use super::*;
    use crate::domain::Identity;
    use crate::test_support::{FixedClock, InMemoryDirectory};
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn pinned() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn store(pinned: DateTime<Utc>) -> Arc<InMemoryDirectory> {
        Arc::new(InMemoryDirectory::with_clock(Arc::new(FixedClock(pinned))))
    }

    fn identity(name: Option<&str>) -> IdentitySnapshot {
        let email = EmailAddress::new("ada@example.com").expect("valid email");
        IdentitySnapshot::signed_in(Identity::new(email, name.map(str::to_owned)))
    }

    fn ready(view: ProfileView) -> Profile {
        match view {
            ProfileView::Ready(profile) => profile,
            other => panic!("expected a profile, got {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn loading_and_signed_out(store: Arc<InMemoryDirectory>) {
        let loader = ProfileLoader::new(UserDirectoryClient::new(store));

        assert_eq!(
            loader.load(&IdentitySnapshot::loading()).await,
            ProfileView::Loading
        );
        assert_eq!(
            loader.load(&IdentitySnapshot::signed_out()).await,
            ProfileView::SignedOut
        );
    }

    #[rstest]
    #[tokio::test]
    async fn creates_directory_user_on_first_visit(store: Arc<InMemoryDirectory>) {
        let loader = ProfileLoader::new(UserDirectoryClient::new(store.clone()));

        let profile = ready(loader.load(&identity(Some("Ada Lovelace"))).await);

        assert_eq!(profile.source, ProfileSource::Directory);
        assert_eq!(profile.name_label(), "Ada Lovelace");
        assert_eq!(profile.email_label(), "ada@example.com");
        assert_eq!(profile.member_since_label(), "2024-03-09");
        assert_eq!(store.calls().create, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn prefers_directory_name_over_identity(store: Arc<InMemoryDirectory>) {
        store.seed_user("ada@example.com", "Countess of Lovelace");
        let loader = ProfileLoader::new(UserDirectoryClient::new(store.clone()));

        let profile = ready(loader.load(&identity(Some("Ada Lovelace"))).await);

        assert_eq!(profile.name_label(), "Countess of Lovelace");
        assert_eq!(store.calls().create, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn falls_back_to_identity_when_directory_fails(store: Arc<InMemoryDirectory>) {
        store.fail_lookups(true);
        let loader = ProfileLoader::new(UserDirectoryClient::new(store));

        let profile = ready(loader.load(&identity(None)).await);

        assert_eq!(profile.source, ProfileSource::IdentityFallback);
        assert_eq!(profile.name_label(), "Anonymous User");
        assert_eq!(profile.member_since_label(), NOT_AVAILABLE);
    }

    #[rstest]
    #[tokio::test]
    async fn identity_without_email_is_not_registered(store: Arc<InMemoryDirectory>) {
        let loader = ProfileLoader::new(UserDirectoryClient::new(store.clone()));
        let snapshot = IdentitySnapshot::signed_in(Identity {
            username: Some("ada".to_owned()),
            ..Identity::default()
        });

        let profile = ready(loader.load(&snapshot).await);

        assert_eq!(profile.name_label(), "ada");
        assert_eq!(profile.email_label(), NOT_AVAILABLE);
        assert_eq!(store.calls().find_by_email, 0);
    }
}
