//! Checkout error types.

use common::{Money, NationalId};
use doc_store::DocStoreError;
use domain::{DomainError, ProductId, StoreId};
use ledger::LedgerError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during cart mutation, peer transfers, or
/// checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The caller's cart is absent or has no items. Precondition failure,
    /// not a system error.
    #[error("Cart is empty")]
    CartEmpty,

    /// The caller has no ledger account.
    #[error("No account found for client {0}")]
    AccountNotFound(NationalId),

    /// Advisory balance check failed, or a leg discovered insufficient
    /// funds atomically and every applied leg was reversed.
    #[error("Insufficient funds: balance {balance} does not cover total {total}")]
    InsufficientFunds { balance: Money, total: Money },

    /// A cart subtotal references a store with no payout account; no
    /// transfer leg has run.
    #[error("Store {0} has no payout account")]
    MissingPayoutAccount(StoreId),

    /// The referenced product does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The caller does not own the source account.
    #[error("Caller does not own the source account")]
    Forbidden,

    /// A transfer leg failed and one or more compensating reverse
    /// transfers also failed: the ledger holds partially-applied legs.
    /// Distinct from precondition failures; requires operator attention.
    #[error(
        "Checkout {correlation_id} partially failed: {reason}; stores with unreversed legs: {stuck_stores:?}"
    )]
    PartialFailure {
        correlation_id: Uuid,
        reason: String,
        stuck_stores: Vec<StoreId>,
    },

    /// The order was recorded but the cart could not be deleted. The
    /// order exists; transfers are never re-run. The stale cart can be
    /// deleted later — delete-by-key is idempotent.
    #[error("Order {order_number} recorded but cart cleanup failed")]
    CleanupFailed { order_number: String },

    /// Domain validation failure (quantity, score).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Ledger store error.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Document store error.
    #[error("Document store error: {0}")]
    Store(#[from] DocStoreError),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
