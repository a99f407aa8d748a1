//! Checkout orchestrator: the cross-store saga.

use common::{AccountNumber, CartKey, Identity, Money};
use doc_store::DocumentStore;
use domain::{Cart, Order, PaymentLine, StoreId};
use ledger::{LedgerError, LedgerStore};
use uuid::Uuid;

use crate::error::CheckoutError;
use crate::state::CheckoutState;

/// Result of a successful (or idempotently replayed) checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    /// Order number of the recorded order.
    pub order_number: String,

    /// Total paid.
    pub total: Money,

    /// Correlation ID of the checkout execution that produced the order.
    pub correlation_id: Uuid,
}

/// Orchestrates checkout across the ledger store and the document store.
///
/// The two stores share no transaction manager, so the transfer phase is
/// run as a compensable saga: legs execute strictly sequentially in
/// subtotal enumeration order, and on failure every already-applied leg
/// is reversed (destination back to source) in reverse order before the
/// error is surfaced. The order insert is the point of no return: once it
/// succeeds, transfers are never re-run or reversed, and a cleanup
/// failure only leaves a stale cart behind.
pub struct CheckoutOrchestrator<L, D>
where
    L: LedgerStore,
    D: DocumentStore,
{
    ledger: L,
    docs: D,
}

struct TransferLeg {
    store_id: StoreId,
    destination: AccountNumber,
    amount: Money,
}

impl<L, D> CheckoutOrchestrator<L, D>
where
    L: LedgerStore,
    D: DocumentStore,
{
    /// Creates a new checkout orchestrator.
    pub fn new(ledger: L, docs: D) -> Self {
        Self { ledger, docs }
    }

    /// Executes a checkout for the caller's cart.
    ///
    /// An `idempotency_key` previously seen for this buyer short-circuits
    /// to the recorded order without touching the ledger, so duplicate
    /// submissions are safe.
    #[tracing::instrument(skip(self, identity), fields(client = %identity.national_id))]
    pub async fn execute(
        &self,
        identity: &Identity,
        idempotency_key: Option<String>,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        metrics::counter!("checkout_executions_total").increment(1);
        let start = std::time::Instant::now();
        let correlation_id = Uuid::new_v4();

        // Duplicate submission check runs before anything else: after a
        // successful checkout the cart is gone, and the retry must see
        // the recorded order rather than CART_EMPTY.
        if let Some(ref key) = idempotency_key {
            if let Some(order) = self
                .docs
                .find_order_by_idempotency_key(&identity.national_id, key)
                .await?
            {
                tracing::info!(order_number = %order.order_number, "idempotent replay");
                return Ok(CheckoutReceipt {
                    order_number: order.order_number,
                    total: order.total,
                    correlation_id: order.correlation_id,
                });
            }
        }

        let result = self
            .run_saga(identity, idempotency_key, correlation_id)
            .await;

        let duration = start.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        match &result {
            Ok(receipt) => {
                metrics::counter!("checkout_completed").increment(1);
                tracing::info!(%correlation_id, order_number = %receipt.order_number, duration, "checkout completed");
            }
            Err(e) => {
                metrics::counter!("checkout_failed").increment(1);
                tracing::warn!(%correlation_id, error = %e, "checkout failed");
            }
        }
        result
    }

    async fn run_saga(
        &self,
        identity: &Identity,
        idempotency_key: Option<String>,
        correlation_id: Uuid,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let mut state = CheckoutState::Fetching;
        tracing::debug!(%state, "checkout step");

        let key = CartKey::for_identity(&identity.national_id);
        let cart = self
            .docs
            .get_cart(&key)
            .await?
            .filter(|c| !c.is_empty())
            .ok_or(CheckoutError::CartEmpty)?;

        state = CheckoutState::Verifying;
        tracing::debug!(%state, "checkout step");

        let account = self
            .ledger
            .get_account(&identity.national_id)
            .await?
            .ok_or_else(|| CheckoutError::AccountNotFound(identity.national_id.clone()))?;

        // Advisory only: the balance can change between this read and the
        // transfer legs. The authoritative check happens atomically inside
        // each transfer.
        if account.balance < cart.total {
            return Err(CheckoutError::InsufficientFunds {
                balance: account.balance,
                total: cart.total,
            });
        }

        // Every leg must have a destination before any leg runs.
        let legs = Self::build_legs(&cart)?;

        state = CheckoutState::Transferring;
        tracing::debug!(%state, legs = legs.len(), "checkout step");

        let mut applied: Vec<&TransferLeg> = Vec::new();
        for leg in &legs {
            match self
                .ledger
                .transfer(&account.number, &leg.destination, leg.amount)
                .await
            {
                Ok(()) => applied.push(leg),
                Err(e) => {
                    self.compensate(&account.number, &applied, correlation_id, &e.to_string())
                        .await?;
                    // All applied legs reversed; surface the leg failure
                    // as the precondition it is where possible.
                    return Err(match e {
                        LedgerError::InsufficientFunds { .. } => {
                            CheckoutError::InsufficientFunds {
                                balance: account.balance,
                                total: cart.total,
                            }
                        }
                        other => CheckoutError::Ledger(other),
                    });
                }
            }
        }

        state = CheckoutState::Recording;
        tracing::debug!(%state, "checkout step");

        let payment_summary: Vec<PaymentLine> = legs
            .iter()
            .map(|leg| PaymentLine {
                store_id: leg.store_id.clone(),
                amount: leg.amount,
                destination_account: leg.destination.clone(),
            })
            .collect();

        let order = Order::from_completed_checkout(
            &cart,
            account.number.clone(),
            payment_summary,
            correlation_id,
            idempotency_key,
        );

        if let Err(e) = self.docs.insert_order(&order).await {
            // All legs applied but the order cannot be recorded: an order
            // must exist iff all transfers succeeded, so reverse them.
            self.compensate(&account.number, &applied, correlation_id, &e.to_string())
                .await?;
            return Err(CheckoutError::Store(e));
        }

        state = CheckoutState::Cleaning;
        tracing::debug!(%state, "checkout step");

        if self.docs.delete_cart(&key).await.is_err() {
            // Past the point of no return: never re-run transfers. The
            // delete is idempotent, so retry once and otherwise leave the
            // stale cart for later cleanup.
            if let Err(e) = self.docs.delete_cart(&key).await {
                tracing::error!(%correlation_id, order_number = %order.order_number, error = %e, "cart cleanup failed after order was recorded");
                return Err(CheckoutError::CleanupFailed {
                    order_number: order.order_number,
                });
            }
        }

        state = CheckoutState::Done;
        tracing::debug!(%state, "checkout step");

        Ok(CheckoutReceipt {
            order_number: order.order_number,
            total: order.total,
            correlation_id,
        })
    }

    fn build_legs(cart: &Cart) -> Result<Vec<TransferLeg>, CheckoutError> {
        cart.subtotals
            .iter()
            .map(|subtotal| {
                let destination = subtotal.payout_account.clone().ok_or_else(|| {
                    CheckoutError::MissingPayoutAccount(subtotal.store_id.clone())
                })?;
                Ok(TransferLeg {
                    store_id: subtotal.store_id.clone(),
                    destination,
                    amount: subtotal.subtotal,
                })
            })
            .collect()
    }

    /// Reverses already-applied legs in reverse order.
    ///
    /// Compensation failures do not stop the remaining reversals; any leg
    /// left unreversed is reported as `PartialFailure`.
    async fn compensate(
        &self,
        source: &AccountNumber,
        applied: &[&TransferLeg],
        correlation_id: Uuid,
        reason: &str,
    ) -> Result<(), CheckoutError> {
        if applied.is_empty() {
            return Ok(());
        }

        metrics::counter!("checkout_compensations_total").increment(1);
        tracing::warn!(%correlation_id, legs = applied.len(), reason, "compensating applied transfer legs");

        let mut stuck_stores = Vec::new();
        for leg in applied.iter().rev() {
            match self
                .ledger
                .transfer(&leg.destination, source, leg.amount)
                .await
            {
                Ok(()) => {
                    tracing::info!(%correlation_id, store = %leg.store_id, "leg compensated");
                }
                Err(e) => {
                    tracing::error!(%correlation_id, store = %leg.store_id, error = %e, "compensation failed");
                    stuck_stores.push(leg.store_id.clone());
                }
            }
        }

        if stuck_stores.is_empty() {
            Ok(())
        } else {
            Err(CheckoutError::PartialFailure {
                correlation_id,
                reason: reason.to_string(),
                stuck_stores,
            })
        }
    }
}
