//! PostgreSQL-backed `RewardLedger` adapter.
//!
//! Balances are derived on every read: credits are transactions whose type
//! starts with `earned_`, debits are `redeemed` transactions, and the
//! difference is clamped at zero. Available rewards sum the points of
//! rewards still flagged as available.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable};
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{RewardLedger, RewardLedgerError};
use crate::domain::{Balance, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::{rewards, transactions};

/// Transaction type prefix for credits.
pub const EARNED_PREFIX: &str = "earned_";
/// Transaction type for debits.
pub const REDEEMED: &str = "redeemed";

/// Diesel implementation of [`RewardLedger`].
#[derive(Clone)]
pub struct DieselRewardLedger {
    pool: DbPool,
}

impl DieselRewardLedger {
    /// Create an adapter over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_error(error: &diesel::result::Error) -> RewardLedgerError {
    map_diesel_error(error, RewardLedgerError::query, RewardLedgerError::connection)
}

fn earned_total(user_id: UserId) -> transactions::BoxedQuery<'static, Pg, Nullable<BigInt>> {
    transactions::table
        .filter(transactions::user_id.eq(user_id.get()))
        .filter(transactions::kind.like(format!("{EARNED_PREFIX}%")))
        .select(diesel::dsl::sum(transactions::amount))
        .into_boxed()
}

fn redeemed_total(user_id: UserId) -> transactions::BoxedQuery<'static, Pg, Nullable<BigInt>> {
    transactions::table
        .filter(transactions::user_id.eq(user_id.get()))
        .filter(transactions::kind.eq(REDEEMED))
        .select(diesel::dsl::sum(transactions::amount))
        .into_boxed()
}

fn available_total(user_id: UserId) -> rewards::BoxedQuery<'static, Pg, Nullable<BigInt>> {
    rewards::table
        .filter(rewards::user_id.eq(user_id.get()))
        .filter(rewards::is_available.eq(true))
        .select(diesel::dsl::sum(rewards::points))
        .into_boxed()
}

#[async_trait]
impl RewardLedger for DieselRewardLedger {
    async fn user_balance(&self, user_id: UserId) -> Result<Balance, RewardLedgerError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RewardLedgerError::connection))?;

        let earned: Option<i64> = earned_total(user_id)
            .get_result(&mut conn)
            .await
            .map_err(|err| map_error(&err))?;
        let redeemed: Option<i64> = redeemed_total(user_id)
            .get_result(&mut conn)
            .await
            .map_err(|err| map_error(&err))?;

        let net = earned.unwrap_or(0) - redeemed.unwrap_or(0);
        debug!(user_id = %user_id, net, "balance derived from transactions");
        Ok(Balance::from_points(net))
    }

    async fn available_rewards(&self, user_id: UserId) -> Result<Balance, RewardLedgerError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RewardLedgerError::connection))?;

        let points: Option<i64> = available_total(user_id)
            .get_result(&mut conn)
            .await
            .map_err(|err| map_error(&err))?;

        Ok(Balance::from_points(points.unwrap_or(0)))
    }
}
