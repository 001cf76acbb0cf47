//! Non-negative monetary amounts.
//!
//! The store sells in a single currency (INR), so a price is just a
//! non-negative decimal. Arithmetic stays in `Decimal` to avoid float drift
//! when totals are summed over many line items.
//!
//! Prices are bounded to what the `NUMERIC(12, 2)` columns hold: at most
//! two decimal places and no more than [`Price::MAX`]. Products of line
//! items are computed with checked arithmetic; the infallible operators
//! saturate at `Price::MAX` instead of overflowing.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Error returned when an amount cannot be a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),

    #[error("price exceeds the maximum of {max} (got {0})", max = Price::MAX)]
    TooLarge(Decimal),

    #[error("price has more than two decimal places (got {0})")]
    TooPrecise(Decimal),
}

/// A non-negative amount in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The largest storable amount, `9999999999.99`.
    pub const MAX: Self = Self(Decimal::from_parts(3_567_587_327, 232, 0, false, 2));

    /// Create a price, rejecting negative, oversized or sub-paisa amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if `amount` is below zero, above [`Price::MAX`],
    /// or has more than two significant decimal places.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise(amount));
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, or `None` above [`Price::MAX`].
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .and_then(Self::bounded)
    }

    /// `self + rhs`, or `None` above [`Price::MAX`].
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).and_then(Self::bounded)
    }

    /// Price of `quantity` units, saturating at [`Price::MAX`].
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        self.checked_times(quantity).unwrap_or(Self::MAX)
    }

    fn bounded(amount: Decimal) -> Option<Self> {
        (amount <= Self::MAX.0).then_some(Self(amount))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Add for Price {
    type Output = Self;

    /// Saturates at [`Price::MAX`].
    fn add(self, rhs: Self) -> Self {
        self.checked_add(rhs).unwrap_or(Self::MAX)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
