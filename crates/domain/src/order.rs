//! Immutable order records.

use chrono::{DateTime, Utc};
use common::{AccountNumber, Money, NationalId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, CartItem};
use crate::storefront::StoreId;

/// Terminal status of an order record.
///
/// Orders are written exactly once, after all transfer legs succeeded, so
/// the only persisted status today is `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// All transfers applied and the record is durable.
    Completed,
}

impl OrderStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of the per-store payment summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLine {
    /// Store that was paid.
    pub store_id: StoreId,

    /// Amount transferred to the store.
    pub amount: Money,

    /// Destination payout account.
    pub destination_account: AccountNumber,
}

/// Immutable record of a successful checkout.
///
/// Created exactly once per checkout, after all constituent transfers
/// succeeded; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Globally unique, human-traceable order number.
    pub order_number: String,

    /// National ID of the buyer.
    pub buyer: NationalId,

    /// Source account the purchase was paid from.
    pub account_number: AccountNumber,

    /// Snapshot of the cart items at checkout time.
    pub items: Vec<CartItem>,

    /// Per-store payment summary, one line per transfer leg.
    pub payment_summary: Vec<PaymentLine>,

    /// Grand total paid.
    pub total: Money,

    /// Terminal status.
    pub status: OrderStatus,

    /// Correlation ID of the checkout that produced this order.
    pub correlation_id: Uuid,

    /// Caller-supplied idempotency key, if any.
    pub idempotency_key: Option<String>,

    /// Purchase timestamp.
    pub purchased_at: DateTime<Utc>,
}

impl Order {
    /// Builds the order record for a completed checkout.
    ///
    /// The order number is derived from the purchase timestamp and the
    /// last four characters of the buyer's national ID
    /// (`ORD-{yyyymmddHHMMSS}-{nnnn}`).
    pub fn from_completed_checkout(
        cart: &Cart,
        account_number: AccountNumber,
        payment_summary: Vec<PaymentLine>,
        correlation_id: Uuid,
        idempotency_key: Option<String>,
    ) -> Self {
        let purchased_at = Utc::now();
        let order_number = format!(
            "ORD-{}-{}",
            purchased_at.format("%Y%m%d%H%M%S"),
            cart.owner.last_four()
        );

        Self {
            order_number,
            buyer: cart.owner.clone(),
            account_number,
            items: cart.items.clone(),
            payment_summary,
            total: cart.total,
            status: OrderStatus::Completed,
            correlation_id,
            idempotency_key,
            purchased_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductId;

    fn cart_with_one_item() -> Cart {
        let mut cart = Cart::new(NationalId::new("12345678"));
        cart.items.push(CartItem {
            product_id: ProductId::new("p1"),
            store_id: StoreId::new("store-a"),
            sku: "SKU-p1".to_string(),
            name: "Product p1".to_string(),
            quantity: 2,
            unit_price: Money::from_cents(1500),
        });
        cart.total = Money::from_cents(3000);
        cart
    }

    #[test]
    fn order_number_carries_identity_fragment() {
        let cart = cart_with_one_item();
        let order = Order::from_completed_checkout(
            &cart,
            AccountNumber::new("ACC-1"),
            vec![],
            Uuid::new_v4(),
            None,
        );

        assert!(order.order_number.starts_with("ORD-"));
        assert!(order.order_number.ends_with("-5678"));
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn order_snapshots_cart_items_and_total() {
        let cart = cart_with_one_item();
        let order = Order::from_completed_checkout(
            &cart,
            AccountNumber::new("ACC-1"),
            vec![PaymentLine {
                store_id: StoreId::new("store-a"),
                amount: Money::from_cents(3000),
                destination_account: AccountNumber::new("ACC-STORE-A"),
            }],
            Uuid::new_v4(),
            Some("idem-1".to_string()),
        );

        assert_eq!(order.items, cart.items);
        assert_eq!(order.total, cart.total);
        assert_eq!(order.idempotency_key.as_deref(), Some("idem-1"));
    }

    #[test]
    fn status_display() {
        assert_eq!(OrderStatus::Completed.to_string(), "COMPLETED");
    }
}
