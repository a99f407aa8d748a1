//! MongoDB document store implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use common::{CartKey, NationalId};
use domain::{Cart, Order, Product, ProductId, Review, StoreFront, StoreId};
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use crate::store::DocumentStore;
use crate::{DocStoreError, Result};

const CARTS_COLLECTION: &str = "carts";
const PRODUCTS_COLLECTION: &str = "products";
const STORES_COLLECTION: &str = "stores";
const ORDERS_COLLECTION: &str = "orders";
const REVIEWS_COLLECTION: &str = "reviews";

/// MongoDB implementation of the document store.
#[derive(Clone)]
pub struct MongoDocStore {
    carts: Collection<Document>,
    products: Collection<Document>,
    stores: Collection<Document>,
    orders: Collection<Document>,
    reviews: Collection<Document>,
}

impl MongoDocStore {
    /// Creates a new MongoDB document store.
    pub async fn new(client: &Client, database_name: &str) -> Result<Self> {
        let database = client.database(database_name);
        let store = Self::from_database(&database);
        store.init().await?;
        Ok(store)
    }

    fn from_database(database: &Database) -> Self {
        Self {
            carts: database.collection(CARTS_COLLECTION),
            products: database.collection(PRODUCTS_COLLECTION),
            stores: database.collection(STORES_COLLECTION),
            orders: database.collection(ORDERS_COLLECTION),
            reviews: database.collection(REVIEWS_COLLECTION),
        }
    }

    /// Initialize indexes for the query paths.
    async fn init(&self) -> Result<()> {
        // Idempotency lookups: one order per (buyer, idempotency_key).
        let idempotency_index = IndexModel::builder()
            .keys(doc! { "buyer": 1, "idempotency_key": 1 })
            .options(IndexOptions::builder().unique(true).sparse(true).build())
            .build();
        self.orders.create_index(idempotency_index).await?;

        // Order history by buyer.
        let buyer_index = IndexModel::builder()
            .keys(doc! { "buyer": 1, "purchased_at": -1 })
            .build();
        self.orders.create_index(buyer_index).await?;

        Ok(())
    }

    /// Documents written by catalog tooling key on `_id`; mirror it into
    /// the typed `id` field before deserializing.
    fn with_id_field(mut doc: Document) -> Document {
        if let Ok(id) = doc.get_str("_id") {
            let id = id.to_string();
            doc.insert("id", id);
        }
        doc
    }

    fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
        use mongodb::error::{ErrorKind, WriteFailure};
        matches!(
            *err.kind,
            ErrorKind::Write(WriteFailure::WriteError(ref write_err))
                if write_err.code == 11000
        )
    }
}

#[async_trait]
impl DocumentStore for MongoDocStore {
    async fn get_cart(&self, key: &CartKey) -> Result<Option<Cart>> {
        let doc = self.carts.find_one(doc! { "_id": key.as_str() }).await?;
        doc.map(|d| Ok(bson::from_document(d)?)).transpose()
    }

    async fn upsert_cart(&self, cart: &Cart) -> Result<u64> {
        let new_version = cart.version + 1;

        let mut replacement = bson::to_document(cart)?;
        replacement.insert("_id", cart.key.as_str());
        replacement.insert("version", new_version as i64);

        let filter = doc! {
            "_id": cart.key.as_str(),
            "version": cart.version as i64,
        };

        if cart.version == 0 {
            // Fresh cart: upsert. If the document already exists at a
            // newer version the filter misses and the upsert insert
            // collides on _id, which surfaces as a duplicate key error.
            match self.carts.replace_one(filter, replacement).upsert(true).await {
                Ok(_) => Ok(new_version),
                Err(e) if Self::is_duplicate_key(&e) => Err(DocStoreError::VersionConflict {
                    key: cart.key.clone(),
                    expected: cart.version,
                }),
                Err(e) => Err(e.into()),
            }
        } else {
            let result = self.carts.replace_one(filter, replacement).await?;
            if result.matched_count == 0 {
                return Err(DocStoreError::VersionConflict {
                    key: cart.key.clone(),
                    expected: cart.version,
                });
            }
            Ok(new_version)
        }
    }

    async fn delete_cart(&self, key: &CartKey) -> Result<()> {
        self.carts.delete_one(doc! { "_id": key.as_str() }).await?;
        Ok(())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>> {
        let doc = self.products.find_one(doc! { "_id": id.as_str() }).await?;
        doc.map(|d| Ok(bson::from_document(Self::with_id_field(d))?))
            .transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let mut cursor = self.products.find(doc! {}).await?;
        let mut products = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            products.push(bson::from_document(Self::with_id_field(doc))?);
        }
        Ok(products)
    }

    async fn get_stores(&self, ids: &[StoreId]) -> Result<HashMap<StoreId, StoreFront>> {
        let id_strs: Vec<&str> = ids.iter().map(StoreId::as_str).collect();
        let mut cursor = self
            .stores
            .find(doc! { "_id": { "$in": id_strs } })
            .await?;

        let mut stores = HashMap::new();
        while let Some(doc) = cursor.try_next().await? {
            let store: StoreFront = bson::from_document(Self::with_id_field(doc))?;
            stores.insert(store.id.clone(), store);
        }
        Ok(stores)
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut doc = bson::to_document(order)?;
        doc.insert("_id", order.order_number.as_str());

        match self.orders.insert_one(doc).await {
            Ok(_) => Ok(()),
            Err(e) if Self::is_duplicate_key(&e) => {
                Err(DocStoreError::DuplicateOrder(order.order_number.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_order_by_idempotency_key(
        &self,
        buyer: &NationalId,
        key: &str,
    ) -> Result<Option<Order>> {
        let doc = self
            .orders
            .find_one(doc! { "buyer": buyer.as_str(), "idempotency_key": key })
            .await?;
        doc.map(|d| Ok(bson::from_document(d)?)).transpose()
    }

    async fn insert_review(&self, review: &Review) -> Result<String> {
        let doc = bson::to_document(review)?;
        let result = self.reviews.insert_one(doc).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .map_or_else(|| result.inserted_id.to_string(), |oid| oid.to_hex());
        Ok(id)
    }
}
