//! Cart read and mutation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use doc_store::DocumentStore;
use domain::{Cart, ProductId};
use ledger::LedgerStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::bearer_identity;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub store_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct StoreSubtotalResponse {
    pub store_id: String,
    pub subtotal_cents: i64,
    pub payout_account: Option<String>,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub subtotals: Vec<StoreSubtotalResponse>,
    pub total_cents: i64,
    pub version: u64,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct CartEnvelopeResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<CartResponse>,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        CartResponse {
            items: cart
                .items
                .iter()
                .map(|item| CartItemResponse {
                    product_id: item.product_id.as_str().to_string(),
                    store_id: item.store_id.as_str().to_string(),
                    sku: item.sku.clone(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                    line_total_cents: item.line_total().cents(),
                })
                .collect(),
            subtotals: cart
                .subtotals
                .iter()
                .map(|s| StoreSubtotalResponse {
                    store_id: s.store_id.as_str().to_string(),
                    subtotal_cents: s.subtotal.cents(),
                    payout_account: s
                        .payout_account
                        .as_ref()
                        .map(|a| a.as_str().to_string()),
                })
                .collect(),
            total_cents: cart.total.cents(),
            version: cart.version,
            updated_at: cart.updated_at.to_rfc3339(),
        }
    }
}

/// GET /api/cart — the caller's cart. An absent cart is not an error.
#[tracing::instrument(skip(state, headers))]
pub async fn get<L, D>(
    State(state): State<Arc<AppState<L, D>>>,
    headers: HeaderMap,
) -> Result<Json<CartEnvelopeResponse>, ApiError>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    let identity = bearer_identity(&state, &headers)?;

    let cart = state.carts.get_cart(&identity).await?;
    Ok(Json(CartEnvelopeResponse {
        exists: cart.is_some(),
        cart: cart.map(CartResponse::from),
    }))
}

/// POST /api/cart/items — add a product to the caller's cart, creating
/// the cart if needed. Returns the cart as written.
#[tracing::instrument(skip(state, headers, req))]
pub async fn add_item<L, D>(
    State(state): State<Arc<AppState<L, D>>>,
    headers: HeaderMap,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    let identity = bearer_identity(&state, &headers)?;

    let cart = state
        .carts
        .add_item(&identity, &ProductId::new(req.product_id), req.quantity)
        .await?;
    Ok(Json(cart.into()))
}
