//! Core services for the banking-and-marketplace backend.
//!
//! This crate holds the core services of the system:
//!
//! 1. [`CartService`] — cart mutation with aggregate recomputation and
//!    optimistic-concurrency retry.
//! 2. [`CheckoutOrchestrator`] — the cross-store checkout saga. The ledger
//!    and the document store share no transaction manager, so the
//!    transfer phase is compensable: if a leg or the order insert fails,
//!    already-applied legs are reversed in reverse order before the
//!    failure is surfaced. Recording the order is the point of no return.
//! 3. [`TransferService`] — peer transfers behind the ownership
//!    authorization gate.

pub mod cart_service;
pub mod error;
pub mod orchestrator;
pub mod state;
pub mod transfer;

pub use cart_service::CartService;
pub use error::CheckoutError;
pub use orchestrator::{CheckoutOrchestrator, CheckoutReceipt};
pub use state::CheckoutState;
pub use transfer::TransferService;
