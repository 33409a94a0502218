//! Ecobin dashboard core.
//!
//! Keeps the header of the Ecobin dashboard in sync with the user directory,
//! the reward ledger and the notification store: identity resolution,
//! balance tracking, notification polling with optimistic acknowledgment,
//! and the shell state the header renders from.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
