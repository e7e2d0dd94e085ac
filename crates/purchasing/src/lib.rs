//! Purchasing documents (event-sourced).
//!
//! Supplier purchases share the packing-aware line item with sales; posting
//! re-validates every line. Pure domain logic: no IO, no storage.

pub mod purchase;

pub use purchase::{
    AddPurchaseItem, CreatePurchase, PostPurchase, Purchase, PurchaseCommand, PurchaseCreated,
    PurchaseEvent, PurchaseId, PurchaseItemAdded, PurchaseItemRemoved, PurchaseItemReplaced,
    PurchaseLine, PurchasePosted, PurchaseStatus, RemovePurchaseItem, ReplacePurchaseItem,
    new_line_item,
};
