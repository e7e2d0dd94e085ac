//! Unit-aware quantity stepping for the manual quantity field.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomerp_core::{DomainError, DomainResult, UnitOfMeasure};

/// Which units take fractional quantities, and the step/minimum per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepPolicy {
    /// Unit names (case-insensitive) that allow fractional quantities.
    pub fractional_units: Vec<String>,
    pub fractional_step: Decimal,
    pub fractional_minimum: Decimal,
    pub whole_step: Decimal,
    pub whole_minimum: Decimal,
}

impl Default for StepPolicy {
    fn default() -> Self {
        let quarter = Decimal::new(25, 2);
        Self {
            fractional_units: ["Meter", "Yard", "M", "Y"]
                .into_iter()
                .map(String::from)
                .collect(),
            fractional_step: quarter,
            fractional_minimum: quarter,
            whole_step: Decimal::ONE,
            whole_minimum: Decimal::ONE,
        }
    }
}

impl StepPolicy {
    pub fn is_fractional(&self, unit: &UnitOfMeasure) -> bool {
        self.fractional_units.iter().any(|name| unit.matches(name))
    }

    pub fn rule_for(&self, unit: &UnitOfMeasure) -> StepRule {
        if self.is_fractional(unit) {
            StepRule {
                step: self.fractional_step,
                minimum: self.fractional_minimum,
                fractional: true,
            }
        } else {
            StepRule {
                step: self.whole_step,
                minimum: self.whole_minimum,
                fractional: false,
            }
        }
    }
}

/// Stepping rule resolved for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRule {
    pub step: Decimal,
    pub minimum: Decimal,
    pub fractional: bool,
}

impl StepRule {
    /// One step up; a validation error past the decimal range.
    pub fn increment(&self, current: Decimal) -> DomainResult<Decimal> {
        current
            .checked_add(self.step)
            .ok_or_else(|| DomainError::validation("quantity is out of range"))
    }

    /// One step down, never below the minimum.
    pub fn decrement(&self, current: Decimal) -> Decimal {
        (current - self.step).max(self.minimum)
    }

    /// Nearest allowed value at or above `value`: whole units round up, and
    /// nothing goes below the minimum.
    pub fn snap(&self, value: Decimal) -> Decimal {
        let value = if self.fractional { value } else { value.ceil() };
        value.max(self.minimum)
    }

    /// Check a directly entered value against the unit's policy.
    pub fn validate(&self, value: Decimal) -> DomainResult<Decimal> {
        if value < self.minimum {
            return Err(DomainError::validation(format!(
                "quantity {value} is below the minimum of {}",
                self.minimum.normalize()
            )));
        }
        if !self.fractional && !value.fract().is_zero() {
            return Err(DomainError::validation(format!(
                "quantity {value} must be a whole number for this unit"
            )));
        }
        Ok(value)
    }
}
