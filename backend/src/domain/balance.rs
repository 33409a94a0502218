//! Reward-token balance value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`Balance::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BalanceValidationError {
    /// The value was NaN or infinite.
    #[error("balance must be a finite number")]
    NotFinite,
    /// The value was below zero.
    #[error("balance must not be negative")]
    Negative,
}

/// Non-negative, finite token balance.
///
/// Displayed with two decimal places.
///
/// # Examples
/// ```
/// use ecobin::domain::Balance;
///
/// let balance = Balance::new(42.5).expect("valid balance");
/// assert_eq!(balance.to_string(), "42.50");
/// assert!(Balance::new(-1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Balance(f64);

impl Balance {
    /// Zero balance; the initial displayed value.
    pub const ZERO: Self = Self(0.0);

    /// Validate and construct a balance.
    pub fn new(value: f64) -> Result<Self, BalanceValidationError> {
        if !value.is_finite() {
            return Err(BalanceValidationError::NotFinite);
        }
        if value < 0.0 {
            return Err(BalanceValidationError::Negative);
        }
        Ok(Self(value))
    }

    /// Build a balance from an integer ledger sum, clamping deficits to zero.
    #[expect(
        clippy::cast_precision_loss,
        reason = "ledger sums stay far below 2^52 points"
    )]
    pub fn from_points(points: i64) -> Self {
        Self(points.max(0) as f64)
    }

    /// Underlying value.
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Balance> for f64 {
    fn from(value: Balance) -> Self {
        value.0
    }
}

impl TryFrom<f64> for Balance {
    type Error = BalanceValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
