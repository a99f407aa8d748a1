//! Shared value types used across the ledger, document store, and checkout
//! crates.

pub mod types;

pub use types::{AccountNumber, CartKey, Identity, Money, NationalId};
