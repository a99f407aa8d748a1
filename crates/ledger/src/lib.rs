//! Ledger store: accounts, balances, and the atomic transfer primitive.
//!
//! The ledger is the sole source of atomicity for balance mutations. The
//! advisory balance check in checkout exists only for early user-facing
//! rejection; the authoritative enforcement (`balance >= amount`) happens
//! inside [`LedgerStore::transfer`], which either fully applies or has no
//! effect.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod types;

pub use error::{LedgerError, Result};
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;
pub use store::LedgerStore;
pub use types::{Account, Movement, User};
