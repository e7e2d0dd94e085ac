//! Operator tooling for stored packing documents.
//!
//! Argument parsing lives in the binary; the handlers here take plain
//! values and a writer so they can be driven from tests.

pub mod audit;
