//! Render model for the dashboard header.
//!
//! [`HeaderRender::compose`] is a pure function of the session state: the
//! identity snapshot, shell flags, the balance on display, the total-earnings
//! figure and the visible notifications. The header renders a loading
//! placeholder until the identity provider has settled.

use serde::Serialize;

use super::shell::{Layout, ShellState};
use super::{Balance, IdentitySnapshot, Notification, NotificationId};

/// Product name shown in the header.
pub const BRAND: &str = "Ecobin";

/// Placeholder shown when the dropdown has nothing to list.
pub const EMPTY_NOTIFICATIONS: &str = "No new notifications";

/// One dropdown entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationItem {
    /// Notification to acknowledge when the entry is clicked.
    pub id: NotificationId,
    /// Category label.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl From<&Notification> for NotificationItem {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            title: notification.kind.clone(),
            message: notification.message.clone(),
        }
    }
}

/// Dropdown contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPanel {
    /// Nothing unread.
    Empty {
        /// Placeholder text.
        placeholder: &'static str,
    },
    /// Unread entries in store order.
    Items {
        /// Entries.
        items: Vec<NotificationItem>,
    },
}

/// Actions offered to a signed-out visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountAction {
    /// Open the sign-in flow.
    SignIn,
    /// Open the sign-up flow.
    SignUp,
}

/// Account menu state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountMenu {
    /// Someone is signed in.
    SignedIn {
        /// Display name, or the email when there is none.
        label: String,
    },
    /// Nobody is signed in.
    SignedOut {
        /// Available entry points.
        actions: [AccountAction; 2],
    },
}

/// Settled header contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderView {
    /// Product name.
    pub brand: &'static str,
    /// Active layout.
    pub layout: Layout,
    /// Whether the sidebar is open.
    pub sidebar_open: bool,
    /// Search field visibility; full layout only.
    pub show_search: bool,
    /// Token balance, two decimals.
    pub balance_label: String,
    /// Total earnings from available rewards, two decimals.
    pub total_earnings_label: String,
    /// Unread count for the badge; `None` hides the badge.
    pub unread_badge: Option<usize>,
    /// Dropdown contents.
    pub notifications: NotificationPanel,
    /// Account menu.
    pub account: AccountMenu,
}

/// What the header renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "render", rename_all = "snake_case")]
pub enum HeaderRender {
    /// Identity provider still loading.
    Loading,
    /// Settled header.
    Ready(HeaderView),
}

impl HeaderRender {
    /// Build the header for the given session state.
    pub fn compose(
        identity: &IdentitySnapshot,
        shell: ShellState,
        balance: Balance,
        total_earnings: Balance,
        notifications: &[Notification],
    ) -> Self {
        if !identity.is_loaded {
            return Self::Loading;
        }

        let items: Vec<NotificationItem> =
            notifications.iter().map(NotificationItem::from).collect();
        let unread_badge = (!items.is_empty()).then_some(items.len());
        let notifications = if items.is_empty() {
            NotificationPanel::Empty {
                placeholder: EMPTY_NOTIFICATIONS,
            }
        } else {
            NotificationPanel::Items { items }
        };

        let account = match identity.user.as_ref().and_then(|user| user.account_label()) {
            Some(label) => AccountMenu::SignedIn { label },
            None => AccountMenu::SignedOut {
                actions: [AccountAction::SignIn, AccountAction::SignUp],
            },
        };

        Self::Ready(HeaderView {
            brand: BRAND,
            layout: shell.layout(),
            sidebar_open: shell.sidebar_open(),
            show_search: shell.layout().shows_search(),
            balance_label: balance.to_string(),
            total_earnings_label: total_earnings.to_string(),
            unread_badge,
            notifications,
            account,
        })
    }
}
