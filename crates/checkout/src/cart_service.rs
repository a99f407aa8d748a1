//! Cart mutation with optimistic-concurrency retry.

use common::{CartKey, Identity};
use doc_store::{DocStoreError, DocumentStore};
use domain::{Cart, ProductId};

use crate::error::CheckoutError;

/// Write conflicts are rare (one active cart per client), so a small
/// bounded retry is enough.
const MAX_UPSERT_RETRIES: u32 = 3;

/// Reads and mutates cart documents.
///
/// Every mutation re-derives the cart's subtotals and total from its
/// items before writing, and the write carries the version the cart was
/// read at. A concurrent writer bumps the version and the stale write is
/// retried from a fresh read.
pub struct CartService<D: DocumentStore> {
    docs: D,
}

impl<D: DocumentStore> CartService<D> {
    /// Creates a new cart service.
    pub fn new(docs: D) -> Self {
        Self { docs }
    }

    /// Returns the caller's cart, if one exists.
    pub async fn get_cart(&self, identity: &Identity) -> Result<Option<Cart>, CheckoutError> {
        let key = CartKey::for_identity(&identity.national_id);
        Ok(self.docs.get_cart(&key).await?)
    }

    /// Adds `quantity` units of a product to the caller's cart, creating
    /// the cart if it does not exist. Returns the cart as written.
    #[tracing::instrument(skip(self, identity), fields(client = %identity.national_id, product = %product_id))]
    pub async fn add_item(
        &self,
        identity: &Identity,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, CheckoutError> {
        let product = self
            .docs
            .get_product(product_id)
            .await?
            .ok_or_else(|| CheckoutError::ProductNotFound(product_id.clone()))?;

        let key = CartKey::for_identity(&identity.national_id);
        let mut attempts = 0;
        loop {
            let mut cart = self
                .docs
                .get_cart(&key)
                .await?
                .unwrap_or_else(|| Cart::new(identity.national_id.clone()));

            cart.add_product(&product, quantity)?;
            let stores = self.docs.get_stores(&cart.store_ids()).await?;
            cart.recompute(&stores);

            match self.docs.upsert_cart(&cart).await {
                Ok(version) => {
                    cart.version = version;
                    metrics::counter!("cart_items_added_total").increment(1);
                    return Ok(cart);
                }
                Err(DocStoreError::VersionConflict { .. }) if attempts < MAX_UPSERT_RETRIES => {
                    attempts += 1;
                    tracing::debug!(attempts, "cart write conflict, retrying from fresh read");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use doc_store::InMemoryDocStore;
    use domain::{DomainError, Product, StoreFront, StoreId};

    fn identity() -> Identity {
        Identity::new("buyer", "12345678")
    }

    fn setup() -> (CartService<InMemoryDocStore>, InMemoryDocStore) {
        let docs = InMemoryDocStore::new();
        docs.insert_store(StoreFront {
            id: StoreId::new("store-a"),
            name: "Store A".to_string(),
            payout_account: "ACC-STORE-A".into(),
        });
        docs.insert_product(Product {
            id: ProductId::new("p-a"),
            name: "Widget".to_string(),
            sku: "SKU-A".to_string(),
            price: Money::from_cents(1500),
            store_id: StoreId::new("store-a"),
        });
        (CartService::new(docs.clone()), docs)
    }

    #[tokio::test]
    async fn add_item_creates_cart_with_derived_totals() {
        let (service, _docs) = setup();

        let cart = service
            .add_item(&identity(), &ProductId::new("p-a"), 2)
            .await
            .unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total, Money::from_cents(3000));
        assert_eq!(cart.subtotals.len(), 1);
        assert_eq!(cart.subtotals[0].subtotal, cart.total);
        assert_eq!(cart.version, 1);
    }

    #[tokio::test]
    async fn add_item_twice_increments_quantity() {
        let (service, _docs) = setup();
        let product_id = ProductId::new("p-a");

        service.add_item(&identity(), &product_id, 1).await.unwrap();
        let cart = service.add_item(&identity(), &product_id, 2).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.total, Money::from_cents(4500));
        assert_eq!(cart.version, 2);
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let (service, docs) = setup();

        let result = service
            .add_item(&identity(), &ProductId::new("missing"), 1)
            .await;

        assert!(matches!(result, Err(CheckoutError::ProductNotFound(_))));
        let key = CartKey::for_identity(&identity().national_id);
        assert!(docs.get_cart(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let (service, _docs) = setup();

        let result = service.add_item(&identity(), &ProductId::new("p-a"), 0).await;
        assert!(matches!(
            result,
            Err(CheckoutError::Domain(DomainError::InvalidQuantity { .. }))
        ));
    }

    #[tokio::test]
    async fn version_conflict_is_retried() {
        let (service, docs) = setup();
        docs.set_upsert_conflicts(1);

        let cart = service
            .add_item(&identity(), &ProductId::new("p-a"), 1)
            .await
            .unwrap();

        assert_eq!(cart.total, Money::from_cents(1500));
    }

    #[tokio::test]
    async fn persistent_conflict_surfaces_after_retries() {
        let (service, docs) = setup();
        docs.set_upsert_conflicts(MAX_UPSERT_RETRIES + 1);

        let result = service.add_item(&identity(), &ProductId::new("p-a"), 1).await;
        assert!(matches!(
            result,
            Err(CheckoutError::Store(DocStoreError::VersionConflict { .. }))
        ));
    }
}
