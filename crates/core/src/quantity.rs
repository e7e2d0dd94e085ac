//! Non-negative decimal quantities.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A physical quantity (meters, yards, pieces...) that is never negative.
///
/// Construction either rejects negative input (`new`) or clamps it to zero
/// (`clamped`, `parse_clamped`), so a stored `Quantity` is always `>= 0`.
/// Serializes as a plain JSON number.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// Strict constructor: negative values are a validation error.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::validation(format!(
                "quantity must not be negative (got {value})"
            )));
        }
        Ok(Self(value))
    }

    /// Lenient constructor: negative values become zero.
    pub fn clamped(value: Decimal) -> Self {
        Self(value.max(Decimal::ZERO))
    }

    /// Parse user text; anything that is not a number counts as zero.
    pub fn parse_clamped(text: &str) -> Self {
        Decimal::from_str(text.trim())
            .map(Self::clamped)
            .unwrap_or(Self::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Strictly greater than zero. Zero-quantity rows are placeholders.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Sum of two quantities; a validation error when the result leaves the
    /// decimal range.
    pub fn checked_add(self, rhs: Quantity) -> DomainResult<Quantity> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| DomainError::validation("quantity total is out of range"))
    }

    pub fn try_sum<I>(quantities: I) -> DomainResult<Quantity>
    where
        I: IntoIterator<Item = Quantity>,
    {
        quantities
            .into_iter()
            .try_fold(Self::ZERO, |acc, q| acc.checked_add(q))
    }
}

impl ValueObject for Quantity {}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.normalize(), f)
    }
}

/// Round a decimal for display (`scale` places, half away from zero).
pub fn round_for_display(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}
