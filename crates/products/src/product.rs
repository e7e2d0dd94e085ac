use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomerp_core::{AggregateId, DomainError, DomainResult, Entity, UnitOfMeasure};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Which selling price a sale line starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Retail,
    Wholesale,
}

/// Default prices per unit of measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingMetadata {
    pub cost_price: Decimal,
    pub retail_price: Decimal,
    pub wholesale_price: Decimal,
}

/// A sellable / purchasable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    unit: UnitOfMeasure,
    pricing: PricingMetadata,
    variations: Vec<String>,
    supports_packing: bool,
}

impl Product {
    pub fn new(
        id: ProductId,
        sku: impl Into<String>,
        name: impl Into<String>,
        unit: UnitOfMeasure,
        pricing: PricingMetadata,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        let name = name.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        if unit.as_str().is_empty() {
            return Err(DomainError::validation("unit of measure cannot be empty"));
        }
        let prices = [pricing.cost_price, pricing.retail_price, pricing.wholesale_price];
        if prices.iter().any(|p| p.is_sign_negative() && !p.is_zero()) {
            return Err(DomainError::validation("prices cannot be negative"));
        }

        Ok(Self {
            id,
            sku,
            name,
            unit,
            pricing,
            variations: Vec::new(),
            supports_packing: true,
        })
    }

    pub fn with_variations<I, S>(mut self, variations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variations = variations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_packing_support(mut self, supported: bool) -> Self {
        self.supports_packing = supported;
        self
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &UnitOfMeasure {
        &self.unit
    }

    pub fn pricing(&self) -> &PricingMetadata {
        &self.pricing
    }

    pub fn variations(&self) -> &[String] {
        &self.variations
    }

    pub fn has_variations(&self) -> bool {
        !self.variations.is_empty()
    }

    pub fn supports_packing(&self) -> bool {
        self.supports_packing
    }

    /// Starting price for a sale line.
    pub fn sale_price(&self, tier: PriceTier) -> Decimal {
        match tier {
            PriceTier::Retail => self.pricing.retail_price,
            PriceTier::Wholesale => self.pricing.wholesale_price,
        }
    }

    /// Starting price for a purchase line.
    pub fn purchase_price(&self) -> Decimal {
        self.pricing.cost_price
    }

    /// Resolve a requested variation; products without variations accept none.
    pub fn resolve_variation(&self, requested: Option<&str>) -> DomainResult<Option<String>> {
        match (self.has_variations(), requested) {
            (false, None) => Ok(None),
            (false, Some(v)) => Err(DomainError::validation(format!(
                "product '{}' has no variations (got '{v}')",
                self.name
            ))),
            (true, None) => Ok(self.variations.first().cloned()),
            (true, Some(v)) => self
                .variations
                .iter()
                .find(|known| known.as_str() == v)
                .cloned()
                .map(Some)
                .ok_or_else(|| {
                    DomainError::validation(format!(
                        "unknown variation '{v}' for product '{}'",
                        self.name
                    ))
                }),
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
