//! Domain primitives, ports and dashboard services.
//!
//! Purpose: Define strongly typed domain entities and the identity-keyed
//! background tasks that keep the dashboard header in sync with the user
//! directory, reward ledger and notification store. Adapters live in
//! `crate::outbound`; this module only sees the port traits.
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic error payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - DirectoryUser, EmailAddress, DisplayName, UserId: directory records.
//! - Identity, IdentitySnapshot: external identity feed.
//! - Balance, BalanceBus: token balance and its process-wide broadcast.
//! - DashboardSession: mounted header and layout.
//! - ProfileLoader: settings page profile.

pub mod balance;
pub mod balance_bus;
pub mod balance_tracker;
pub mod directory_client;
pub mod epoch;
pub mod error;
pub mod header;
pub mod identity;
pub mod notification;
pub mod notification_poller;
pub mod ports;
pub mod profile;
pub mod session;
pub mod shell;
pub mod total_earnings;
pub mod user;

pub use self::balance::{Balance, BalanceValidationError};
pub use self::balance_bus::{BalanceBus, BalanceSubscription};
pub use self::balance_tracker::{BalanceState, BalanceTracker};
pub use self::directory_client::UserDirectoryClient;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::header::{
    AccountAction, AccountMenu, HeaderRender, HeaderView, NotificationItem, NotificationPanel,
};
pub use self::identity::{Identity, IdentitySnapshot};
pub use self::notification::{Notification, NotificationId};
pub use self::notification_poller::{NotificationPoller, PollerConfig};
pub use self::profile::{Profile, ProfileLoader, ProfileSource, ProfileView};
pub use self::session::{DashboardPorts, DashboardSession, SessionConfig};
pub use self::shell::{Layout, ShellState};
pub use self::total_earnings::TotalEarnings;
pub use self::user::{DirectoryUser, DisplayName, EmailAddress, UserId, UserValidationError};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use ecobin::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<()> {
///     Err(Error::not_found("no such user"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
