//! PostgreSQL adapters for the dashboard ports.
//!
//! Diesel with `diesel-async` over a `bb8` pool. Adapters only translate
//! between row structs and domain types; row structs (`models.rs`) and table
//! definitions (`schema.rs`) stay private to this module.
//!
//! ```no_run
//! use ecobin::outbound::persistence::{DbPool, DieselUserDirectory, PoolConfig};
//!
//! # async fn connect() -> Result<(), ecobin::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/ecobin")).await?;
//! let directory = DieselUserDirectory::new(pool);
//! # let _ = directory;
//! # Ok(())
//! # }
//! ```

mod diesel_error_mapping;
mod diesel_notification_repository;
mod diesel_reward_ledger;
mod diesel_user_directory;
mod migrations;
mod models;
mod pool;
mod schema;

use crate::domain::DashboardPorts;

pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_reward_ledger::{DieselRewardLedger, EARNED_PREFIX, REDEEMED};
pub use diesel_user_directory::DieselUserDirectory;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};

/// Wire every dashboard port to PostgreSQL through `pool`.
pub fn dashboard_ports(pool: &DbPool) -> DashboardPorts {
    use std::sync::Arc;

    DashboardPorts {
        directory: Arc::new(DieselUserDirectory::new(pool.clone())),
        ledger: Arc::new(DieselRewardLedger::new(pool.clone())),
        notifications: Arc::new(DieselNotificationRepository::new(pool.clone())),
    }
}
