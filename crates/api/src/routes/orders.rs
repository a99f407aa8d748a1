//! Checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use doc_store::DocumentStore;
use ledger::LedgerStore;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::bearer_identity;

const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_number: String,
    pub total_cents: i64,
    pub status: &'static str,
    pub correlation_id: String,
}

/// POST /api/orders — check out the caller's cart.
///
/// An optional `Idempotency-Key` header makes retries safe: a key already
/// seen for this buyer returns the previously recorded order without
/// re-running any transfer.
#[tracing::instrument(skip(state, headers))]
pub async fn create<L, D>(
    State(state): State<Arc<AppState<L, D>>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    let identity = bearer_identity(&state, &headers)?;

    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let receipt = state.checkout.execute(&identity, idempotency_key).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            order_number: receipt.order_number,
            total_cents: receipt.total.cents(),
            status: "COMPLETED",
            correlation_id: receipt.correlation_id.to_string(),
        }),
    ))
}
