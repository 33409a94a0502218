//! Port abstraction for reward balances.
use async_trait::async_trait;

use crate::domain::{Balance, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reward ledger adapters.
    pub enum RewardLedgerError {
        /// Ledger connection could not be established.
        Connection { message: String } => "reward ledger connection failed: {message}",
        /// Aggregation query failed.
        Query { message: String } => "reward ledger query failed: {message}",
    }
}

/// Read-only access to the derived reward figures of a user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardLedger: Send + Sync {
    /// Current spendable token balance.
    async fn user_balance(&self, user_id: UserId) -> Result<Balance, RewardLedgerError>;

    /// Sum of rewards still available to the user; the shell's
    /// total-earnings figure.
    async fn available_rewards(&self, user_id: UserId) -> Result<Balance, RewardLedgerError>;
}
