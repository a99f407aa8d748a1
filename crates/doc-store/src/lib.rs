//! Document store holding carts, products, stores, orders, and reviews.
//!
//! Carts are persisted with replace-whole-document semantics guarded by an
//! optimistic version stamp; orders are insert-only. The MongoDB
//! implementation is the production backend; the in-memory implementation
//! mirrors its behavior for tests, including version conflicts.

pub mod error;
pub mod memory;
pub mod mongo;
pub mod store;

pub use error::{DocStoreError, Result};
pub use memory::InMemoryDocStore;
pub use mongo::MongoDocStore;
pub use store::DocumentStore;
