//! Notification records shown in the header dropdown.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Notification primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(i32);

impl NotificationId {
    /// Wrap a raw database identifier.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw database identifier.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message addressed to a directory user.
///
/// Created by processes outside the dashboard. `is_read` moves from `false`
/// to `true` once, when the user acknowledges it; records are never deleted
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Primary key.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Body text.
    pub message: String,
    /// Category label (stored as `type`), shown as the item title.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the recipient has acknowledged it.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
