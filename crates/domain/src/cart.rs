//! Shopping cart document and its derived aggregates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{AccountNumber, CartKey, Money, NationalId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::product::{Product, ProductId};
use crate::storefront::{StoreFront, StoreId};

/// A line item in a cart.
///
/// The unit price is captured from the product at add time; a later price
/// change in the catalog does not affect items already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product reference.
    pub product_id: ProductId,

    /// Store that sells the product.
    pub store_id: StoreId,

    /// Stock-keeping unit, copied from the product.
    pub sku: String,

    /// Display name, copied from the product.
    pub name: String,

    /// Quantity in the cart.
    pub quantity: u32,

    /// Unit price at the time the item was added.
    pub unit_price: Money,
}

impl CartItem {
    /// Returns the line total (unit price × quantity).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Derived per-store subtotal, annotated with the store's payout account.
///
/// A store missing from the batch lookup yields `payout_account: None`
/// rather than a hard failure; checkout rejects such a cart before any
/// transfer leg runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSubtotal {
    /// Store reference.
    pub store_id: StoreId,

    /// Sum of line totals for items of this store.
    pub subtotal: Money,

    /// The store's payout account at recompute time, if the store exists.
    pub payout_account: Option<AccountNumber>,
}

/// A client's shopping cart.
///
/// One active cart per identity, keyed deterministically by the owner's
/// national ID. Persisted with replace-whole-document semantics guarded by
/// an optimistic version stamp; the derived fields (`subtotals`, `total`)
/// are recomputed from `items` on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Deterministic cart key.
    pub key: CartKey,

    /// National ID of the owning client.
    pub owner: NationalId,

    /// Ordered list of line items.
    pub items: Vec<CartItem>,

    /// Derived per-store subtotals, in first-occurrence store order.
    pub subtotals: Vec<StoreSubtotal>,

    /// Derived grand total; always equals the sum of `subtotals`.
    pub total: Money,

    /// Optimistic concurrency stamp, incremented by the store on upsert.
    pub version: u64,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for an identity.
    pub fn new(owner: NationalId) -> Self {
        let now = Utc::now();
        Self {
            key: CartKey::for_identity(&owner),
            owner,
            items: Vec::new(),
            subtotals: Vec::new(),
            total: Money::zero(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the distinct store IDs referenced by the items, in first
    /// occurrence order.
    pub fn store_ids(&self) -> Vec<StoreId> {
        let mut ids: Vec<StoreId> = Vec::new();
        for item in &self.items {
            if !ids.contains(&item.store_id) {
                ids.push(item.store_id.clone());
            }
        }
        ids
    }

    /// Adds a product to the cart, or increments the quantity of an
    /// existing line item for the same product.
    ///
    /// The product's current price and store reference are captured into
    /// the item. Aggregates are not touched here; callers recompute them
    /// with [`Cart::recompute`] once the batch store lookup is available.
    pub fn add_product(&mut self, product: &Product, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity {
                quantity: i64::from(quantity),
            });
        }

        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(item) => item.quantity += quantity,
            None => self.items.push(CartItem {
                product_id: product.id.clone(),
                store_id: product.store_id.clone(),
                sku: product.sku.clone(),
                name: product.name.clone(),
                quantity,
                unit_price: product.price,
            }),
        }

        Ok(())
    }

    /// Recomputes the per-store subtotals and grand total from the current
    /// item list.
    ///
    /// Subtotals are grouped by store with insertion-order-irrelevant
    /// semantics but emitted in first-occurrence store order, which is also
    /// the order checkout transfer legs execute in. Each subtotal is
    /// annotated with the store's current payout account from the batch
    /// lookup; a missing store yields `None`.
    pub fn recompute(&mut self, stores: &HashMap<StoreId, StoreFront>) {
        let mut subtotals: Vec<StoreSubtotal> = Vec::new();
        let mut total = Money::zero();

        for item in &self.items {
            let line = item.line_total();
            total += line;

            match subtotals.iter_mut().find(|s| s.store_id == item.store_id) {
                Some(entry) => entry.subtotal += line,
                None => subtotals.push(StoreSubtotal {
                    store_id: item.store_id.clone(),
                    subtotal: line,
                    payout_account: stores
                        .get(&item.store_id)
                        .map(|s| s.payout_account.clone()),
                }),
            }
        }

        self.subtotals = subtotals;
        self.total = total;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, store: &str, price_cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            price: Money::from_cents(price_cents),
            store_id: StoreId::new(store),
        }
    }

    fn store(id: &str, payout: &str) -> (StoreId, StoreFront) {
        (
            StoreId::new(id),
            StoreFront {
                id: StoreId::new(id),
                name: format!("Store {id}"),
                payout_account: AccountNumber::new(payout),
            },
        )
    }

    #[test]
    fn subtotals_sum_to_total() {
        let mut cart = Cart::new(NationalId::new("12345678"));
        cart.add_product(&product("p1", "store-a", 1000), 3).unwrap();
        cart.add_product(&product("p2", "store-b", 2500), 1).unwrap();
        cart.add_product(&product("p3", "store-a", 750), 2).unwrap();

        let stores: HashMap<_, _> =
            [store("store-a", "ACC-A"), store("store-b", "ACC-B")].into();
        cart.recompute(&stores);

        let sum: Money = cart.subtotals.iter().map(|s| s.subtotal).sum();
        assert_eq!(sum, cart.total);
        assert_eq!(cart.total, Money::from_cents(3 * 1000 + 2500 + 2 * 750));
    }

    #[test]
    fn adding_same_product_increments_quantity() {
        let mut cart = Cart::new(NationalId::new("12345678"));
        let p = product("p1", "store-a", 1000);

        cart.add_product(&p, 2).unwrap();
        cart.add_product(&p, 3).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut cart = Cart::new(NationalId::new("12345678"));
        let err = cart.add_product(&product("p1", "store-a", 100), 0);
        assert!(matches!(
            err,
            Err(DomainError::InvalidQuantity { quantity: 0 })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn price_captured_at_add_time() {
        let mut cart = Cart::new(NationalId::new("12345678"));
        let mut p = product("p1", "store-a", 1000);
        cart.add_product(&p, 1).unwrap();

        // Catalog price changes afterwards; the cart keeps the old price.
        p.price = Money::from_cents(9999);
        assert_eq!(cart.items[0].unit_price, Money::from_cents(1000));
    }

    #[test]
    fn subtotals_grouped_in_first_occurrence_order() {
        let mut cart = Cart::new(NationalId::new("12345678"));
        cart.add_product(&product("p1", "store-b", 2000), 1).unwrap();
        cart.add_product(&product("p2", "store-a", 3000), 1).unwrap();
        cart.add_product(&product("p3", "store-b", 1000), 1).unwrap();

        let stores: HashMap<_, _> =
            [store("store-a", "ACC-A"), store("store-b", "ACC-B")].into();
        cart.recompute(&stores);

        assert_eq!(cart.subtotals.len(), 2);
        assert_eq!(cart.subtotals[0].store_id, StoreId::new("store-b"));
        assert_eq!(cart.subtotals[0].subtotal, Money::from_cents(3000));
        assert_eq!(cart.subtotals[1].store_id, StoreId::new("store-a"));
        assert_eq!(cart.subtotals[1].subtotal, Money::from_cents(3000));
    }

    #[test]
    fn missing_store_yields_none_payout_account() {
        let mut cart = Cart::new(NationalId::new("12345678"));
        cart.add_product(&product("p1", "store-ghost", 500), 1).unwrap();

        cart.recompute(&HashMap::new());

        assert_eq!(cart.subtotals.len(), 1);
        assert!(cart.subtotals[0].payout_account.is_none());
        assert_eq!(cart.total, Money::from_cents(500));
    }

    #[test]
    fn recompute_replaces_stale_aggregates() {
        let mut cart = Cart::new(NationalId::new("12345678"));
        let stores: HashMap<_, _> = [store("store-a", "ACC-A")].into();

        cart.add_product(&product("p1", "store-a", 1000), 1).unwrap();
        cart.recompute(&stores);
        assert_eq!(cart.total, Money::from_cents(1000));

        cart.add_product(&product("p1", "store-a", 1000), 1).unwrap();
        cart.recompute(&stores);
        assert_eq!(cart.total, Money::from_cents(2000));
        assert_eq!(cart.subtotals.len(), 1);
    }
}
