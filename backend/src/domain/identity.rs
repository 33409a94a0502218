//! External identity as supplied by the authentication provider.
//!
//! The dashboard never authenticates anyone itself. It receives an
//! [`IdentitySnapshot`] whenever the provider's state changes and derives
//! everything else (directory record, balance, notifications) from it.

use serde::{Deserialize, Serialize};

use super::user::{DisplayName, EmailAddress};

/// Authenticated subject; read-only from the dashboard's perspective.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Primary email, when the provider has verified one.
    pub primary_email: Option<EmailAddress>,
    /// Full display name.
    pub display_name: Option<String>,
    /// Given name, used when no full name is present.
    pub first_name: Option<String>,
    /// Provider username, the last fallback before the anonymous name.
    pub username: Option<String>,
}

impl Identity {
    /// Build an identity with an email and an optional display name.
    pub fn new(primary_email: EmailAddress, display_name: Option<String>) -> Self {
        Self {
            primary_email: Some(primary_email),
            display_name,
            ..Self::default()
        }
    }

    /// Name to record in the directory.
    ///
    /// Falls back from the display name to the first name, then the
    /// username, and finally to the anonymous placeholder. Blank or invalid
    /// candidates are skipped.
    ///
    /// # Examples
    /// ```
    /// use ecobin::domain::{EmailAddress, Identity};
    ///
    /// let email = EmailAddress::new("ada@example.com").expect("valid email");
    /// let mut identity = Identity::new(email, None);
    /// identity.username = Some("ada".to_owned());
    /// assert_eq!(identity.preferred_display_name().as_ref(), "ada");
    /// ```
    pub fn preferred_display_name(&self) -> DisplayName {
        [&self.display_name, &self.first_name, &self.username]
            .into_iter()
            .flatten()
            .find_map(|candidate| DisplayName::new(candidate.as_str()).ok())
            .unwrap_or_else(DisplayName::anonymous)
    }

    /// Label for the account menu: the full name, or the email without one.
    pub fn account_label(&self) -> Option<String> {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(str::to_owned)
            .or_else(|| self.primary_email.as_ref().map(ToString::to_string))
    }
}

/// Identity collaborator surface: `{ user, is_loaded }`.
///
/// `is_loaded` gates every fetch; nothing is requested before the provider
/// has settled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySnapshot {
    /// Signed-in subject, if any.
    pub user: Option<Identity>,
    /// Whether the provider has finished loading.
    pub is_loaded: bool,
}

impl IdentitySnapshot {
    /// Provider still loading.
    pub fn loading() -> Self {
        Self::default()
    }

    /// Provider loaded with nobody signed in.
    pub fn signed_out() -> Self {
        Self {
            user: None,
            is_loaded: true,
        }
    }

    /// Provider loaded with a signed-in subject.
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            user: Some(identity),
            is_loaded: true,
        }
    }

    /// Email to resolve against the directory, once loading has finished.
    pub fn resolvable_email(&self) -> Option<&EmailAddress> {
        if !self.is_loaded {
            return None;
        }
        self.user.as_ref()?.primary_email.as_ref()
    }
}
