//! Peer transfers behind the ownership gate.

use common::{AccountNumber, Identity, Money};
use ledger::LedgerStore;

use crate::error::CheckoutError;

/// Executes client-initiated transfers.
///
/// The ledger primitive moves money between any two accounts; the
/// authorization gate lives here. The caller must own the source account,
/// checked before the primitive ever runs, and an unknown source is
/// reported the same way as someone else's account.
pub struct TransferService<L: LedgerStore> {
    ledger: L,
}

impl<L: LedgerStore> TransferService<L> {
    /// Creates a new transfer service.
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Transfers `amount` from `source` to `destination` on behalf of the
    /// caller.
    #[tracing::instrument(skip(self, identity), fields(client = %identity.national_id))]
    pub async fn execute(
        &self,
        identity: &Identity,
        source: &AccountNumber,
        destination: &AccountNumber,
        amount: Money,
    ) -> Result<(), CheckoutError> {
        match self.ledger.account_owner(source).await? {
            Some(ref owner) if *owner == identity.national_id => {}
            _ => return Err(CheckoutError::Forbidden),
        }

        self.ledger.transfer(source, destination, amount).await?;
        metrics::counter!("transfers_total").increment(1);
        tracing::info!(%source, %destination, %amount, "transfer executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger::{InMemoryLedger, LedgerError};

    fn setup() -> (TransferService<InMemoryLedger>, InMemoryLedger) {
        let ledger = InMemoryLedger::new();
        ledger.insert_account("ACC-1", "11111111", Money::from_cents(10_000));
        ledger.insert_account("ACC-2", "22222222", Money::from_cents(500));
        (TransferService::new(ledger.clone()), ledger)
    }

    fn owner_of_acc1() -> Identity {
        Identity::new("alice", "11111111")
    }

    #[tokio::test]
    async fn owner_can_transfer() {
        let (service, ledger) = setup();

        service
            .execute(
                &owner_of_acc1(),
                &"ACC-1".into(),
                &"ACC-2".into(),
                Money::from_cents(2_500),
            )
            .await
            .unwrap();

        assert_eq!(
            ledger.balance(&"ACC-1".into()),
            Some(Money::from_cents(7_500))
        );
        assert_eq!(
            ledger.balance(&"ACC-2".into()),
            Some(Money::from_cents(3_000))
        );
    }

    #[tokio::test]
    async fn non_owner_is_forbidden_without_mutation() {
        let (service, ledger) = setup();
        let mallory = Identity::new("mallory", "99999999");

        let result = service
            .execute(
                &mallory,
                &"ACC-1".into(),
                &"ACC-2".into(),
                Money::from_cents(100),
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::Forbidden)));
        assert_eq!(
            ledger.balance(&"ACC-1".into()),
            Some(Money::from_cents(10_000))
        );
        assert_eq!(ledger.movement_count(), 0);
    }

    #[tokio::test]
    async fn unknown_source_is_forbidden() {
        let (service, _ledger) = setup();

        let result = service
            .execute(
                &owner_of_acc1(),
                &"ACC-MISSING".into(),
                &"ACC-2".into(),
                Money::from_cents(100),
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::Forbidden)));
    }

    #[tokio::test]
    async fn insufficient_funds_passes_through() {
        let (service, _ledger) = setup();

        let result = service
            .execute(
                &owner_of_acc1(),
                &"ACC-1".into(),
                &"ACC-2".into(),
                Money::from_cents(50_000),
            )
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::Ledger(LedgerError::InsufficientFunds { .. }))
        ));
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let (service, _ledger) = setup();

        let result = service
            .execute(
                &owner_of_acc1(),
                &"ACC-1".into(),
                &"ACC-2".into(),
                Money::zero(),
            )
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::Ledger(LedgerError::InvalidAmount(_)))
        ));
    }
}
