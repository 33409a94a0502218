//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed directory, ledger and notification
//!   store using Diesel.
//!
//! Adapters translate between domain types and infrastructure
//! representations; they contain no business logic.

pub mod persistence;
