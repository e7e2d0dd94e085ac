//! Packing / quantity composition engine.
//!
//! A line item's physical quantity can be described either as boxes of
//! pieces plus loose pieces (**detailed** entry) or as one aggregate quantity
//! with a separately entered piece count (**quick** entry). The engine derives
//! a single authoritative total from that description; once a line item holds
//! a [`PackingRecord`], its manual quantity is locked to that total.
//!
//! Both the sale and the purchase flows consume this crate through
//! [`LineItem`], so the lock contract and unit-aware stepping exist once.
//!
//! Everything here is synchronous and in-memory. Persistence goes through the
//! [`wire`] adapter at the boundary.

pub mod config;
pub mod line_item;
pub mod model;
pub mod returns;
pub mod session;
pub mod stepping;
pub mod wire;

pub use config::{FieldCasing, PackingConfig};
pub use line_item::{LineItem, QuantityEdit};
pub use model::{BoxId, PackingBox, PackingMode, PackingRecord, PackingTotals, Piece, PieceId};
pub use returns::{PieceRef, ReturnSelection, ReturnSummary, ReturnedPiece};
pub use session::{PackingSession, SavedPacking};
pub use stepping::{StepPolicy, StepRule};
pub use wire::{DecodedPacking, WireError, decode, from_json, to_json};
