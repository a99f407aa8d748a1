//! Domain model for the marketplace side of the system.
//!
//! The documents here (`Cart`, `Product`, `StoreFront`, `Order`, `Review`)
//! are explicit tagged records validated at the store boundary; the cart
//! carries derived aggregates (per-store subtotals and grand total) that are
//! recomputed from the authoritative item list on every mutation, never
//! mutated independently.

pub mod cart;
pub mod error;
pub mod order;
pub mod product;
pub mod review;
pub mod storefront;

pub use cart::{Cart, CartItem, StoreSubtotal};
pub use error::DomainError;
pub use order::{Order, OrderStatus, PaymentLine};
pub use product::{Product, ProductId};
pub use review::Review;
pub use storefront::{StoreFront, StoreId};
