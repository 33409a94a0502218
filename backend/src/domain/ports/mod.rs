//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Ports describe how the dashboard expects to talk to its driven adapters
//! (the user directory, the reward ledger, the notification store). Each
//! trait exposes strongly typed errors so adapters map their failures into
//! predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod notification_repository;
mod reward_ledger;
mod user_directory;

#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use reward_ledger::MockRewardLedger;
pub use reward_ledger::{RewardLedger, RewardLedgerError};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{UserDirectory, UserDirectoryError};
