//! Product catalog entries as seen by the line-item editors.
//!
//! Catalog maintenance lives in the backend; this crate only models what a
//! sale or purchase line needs to know about a product: its unit of measure,
//! default prices, variations and whether packing entry is enabled for it.

pub mod product;

pub use product::{PriceTier, PricingMetadata, Product, ProductId};
