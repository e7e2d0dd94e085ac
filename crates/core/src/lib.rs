//! `loomerp-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! errors, identifiers, quantities and units shared by the catalog, packing,
//! sales and purchasing modules.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod quantity;
pub mod unit;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::{AggregateId, LineId, TenantId};
pub use quantity::{Quantity, round_for_display};
pub use unit::UnitOfMeasure;
pub use value_object::ValueObject;
