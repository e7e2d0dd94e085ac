//! Unit of measure attached to products and line items.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Unit a product is sold and billed in ("Meter", "Yard", "Piece", ...).
///
/// Kept as free text because the catalog is user-maintained; policies that
/// depend on the unit compare names case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitOfMeasure(String);

impl UnitOfMeasure {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    pub fn meter() -> Self {
        Self::new("Meter")
    }

    pub fn yard() -> Self {
        Self::new("Yard")
    }

    pub fn piece() -> Self {
        Self::new("Piece")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name.trim())
    }
}

impl ValueObject for UnitOfMeasure {}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
