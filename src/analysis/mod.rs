//! Analysis modules.
//!
//! Aggregate statistics computed over normalized patent records.

pub mod aggregator;

pub use aggregator::*;
