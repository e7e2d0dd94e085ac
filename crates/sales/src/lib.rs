//! Sales documents (event-sourced).
//!
//! A sale is a customer document whose lines are packing-aware
//! [`loomerp_packing::LineItem`]s. Pure domain logic: no IO, no storage.

pub mod sale;

pub use sale::{
    AddItem, CreateSale, FinalizeSale, ItemAdded, ItemRemoved, ItemReplaced, RemoveItem,
    ReplaceItem, Sale, SaleCommand, SaleCreated, SaleEvent, SaleFinalized, SaleId, SaleLine,
    SaleStatus, new_line_item,
};
