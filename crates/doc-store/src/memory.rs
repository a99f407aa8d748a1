use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{CartKey, NationalId};
use domain::{Cart, Order, Product, ProductId, Review, StoreFront, StoreId};

use crate::store::DocumentStore;
use crate::{DocStoreError, Result};

#[derive(Debug, Default)]
struct InMemoryDocState {
    carts: HashMap<CartKey, Cart>,
    products: HashMap<ProductId, Product>,
    stores: HashMap<StoreId, StoreFront>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
    next_review_id: u32,
    upsert_conflicts_remaining: u32,
    fail_on_insert_order: bool,
    fail_on_delete_cart: bool,
}

/// In-memory document store for testing.
///
/// Mirrors the MongoDB implementation's behavior, including cart version
/// conflicts, and adds failure toggles for exercising the checkout
/// recording and cleanup failure paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocStore {
    state: Arc<RwLock<InMemoryDocState>>,
}

impl InMemoryDocStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a catalog product.
    pub fn insert_product(&self, product: Product) {
        self.state
            .write()
            .unwrap()
            .products
            .insert(product.id.clone(), product);
    }

    /// Inserts or replaces a store.
    pub fn insert_store(&self, store: StoreFront) {
        self.state
            .write()
            .unwrap()
            .stores
            .insert(store.id.clone(), store);
    }

    /// Returns the number of recorded orders.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }

    /// Returns the recorded orders.
    pub fn orders(&self) -> Vec<Order> {
        self.state.read().unwrap().orders.clone()
    }

    /// Returns the number of stored reviews.
    pub fn review_count(&self) -> usize {
        self.state.read().unwrap().reviews.len()
    }

    /// Makes the next `count` cart upserts fail with a version conflict.
    pub fn set_upsert_conflicts(&self, count: u32) {
        self.state.write().unwrap().upsert_conflicts_remaining = count;
    }

    /// Configures order inserts to fail with a store error.
    pub fn set_fail_on_insert_order(&self, fail: bool) {
        self.state.write().unwrap().fail_on_insert_order = fail;
    }

    /// Configures cart deletes to fail with a store error.
    pub fn set_fail_on_delete_cart(&self, fail: bool) {
        self.state.write().unwrap().fail_on_delete_cart = fail;
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocStore {
    async fn get_cart(&self, key: &CartKey) -> Result<Option<Cart>> {
        Ok(self.state.read().unwrap().carts.get(key).cloned())
    }

    async fn upsert_cart(&self, cart: &Cart) -> Result<u64> {
        let mut state = self.state.write().unwrap();

        if state.upsert_conflicts_remaining > 0 {
            state.upsert_conflicts_remaining -= 1;
            return Err(DocStoreError::VersionConflict {
                key: cart.key.clone(),
                expected: cart.version,
            });
        }

        let stored_version = state.carts.get(&cart.key).map_or(0, |c| c.version);
        if stored_version != cart.version {
            return Err(DocStoreError::VersionConflict {
                key: cart.key.clone(),
                expected: cart.version,
            });
        }

        let mut stored = cart.clone();
        stored.version = cart.version + 1;
        let new_version = stored.version;
        state.carts.insert(cart.key.clone(), stored);
        Ok(new_version)
    }

    async fn delete_cart(&self, key: &CartKey) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_delete_cart {
            return Err(DocStoreError::Unavailable(
                "cart delete rejected by test toggle".to_string(),
            ));
        }
        state.carts.remove(key);
        Ok(())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().unwrap().products.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.state.read().unwrap().products.values().cloned().collect())
    }

    async fn get_stores(&self, ids: &[StoreId]) -> Result<HashMap<StoreId, StoreFront>> {
        let state = self.state.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| state.stores.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_insert_order {
            return Err(DocStoreError::Unavailable(
                "order insert rejected by test toggle".to_string(),
            ));
        }
        if state
            .orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(DocStoreError::DuplicateOrder(order.order_number.clone()));
        }
        state.orders.push(order.clone());
        Ok(())
    }

    async fn find_order_by_idempotency_key(
        &self,
        buyer: &NationalId,
        key: &str,
    ) -> Result<Option<Order>> {
        let state = self.state.read().unwrap();
        Ok(state
            .orders
            .iter()
            .find(|o| &o.buyer == buyer && o.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn insert_review(&self, review: &Review) -> Result<String> {
        let mut state = self.state.write().unwrap();
        state.next_review_id += 1;
        let id = format!("REV-{:04}", state.next_review_id);
        state.reviews.push(review.clone());
        Ok(id)
    }
}
