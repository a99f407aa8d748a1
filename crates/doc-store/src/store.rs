use std::collections::HashMap;

use async_trait::async_trait;
use common::{CartKey, NationalId};
use domain::{Cart, Order, Product, ProductId, Review, StoreFront, StoreId};

use crate::Result;

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Loads a cart by its deterministic key.
    ///
    /// An absent cart is not an error.
    async fn get_cart(&self, key: &CartKey) -> Result<Option<Cart>>;

    /// Replaces the whole cart document, creating it if absent.
    ///
    /// `cart.version` is the version the caller read (0 for a cart that
    /// does not exist yet). Fails with `VersionConflict` if the stored
    /// version differs; on success the stored version becomes
    /// `cart.version + 1`, which is also returned.
    async fn upsert_cart(&self, cart: &Cart) -> Result<u64>;

    /// Deletes a cart by key. Deleting an absent cart succeeds, so the
    /// checkout cleanup step can be retried safely.
    async fn delete_cart(&self, key: &CartKey) -> Result<()>;

    /// Loads a product by catalog ID.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Lists the whole catalog.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Batch lookup of stores by ID. Missing stores are simply absent
    /// from the returned map.
    async fn get_stores(&self, ids: &[StoreId]) -> Result<HashMap<StoreId, StoreFront>>;

    /// Durably inserts an order record. Order numbers are unique; an
    /// insert with an existing number fails with `DuplicateOrder`.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Finds a buyer's order previously recorded under an idempotency
    /// key, if any.
    async fn find_order_by_idempotency_key(
        &self,
        buyer: &NationalId,
        key: &str,
    ) -> Result<Option<Order>>;

    /// Inserts a review and returns its assigned ID.
    async fn insert_review(&self, review: &Review) -> Result<String>;
}
