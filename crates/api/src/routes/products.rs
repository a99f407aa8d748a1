//! Catalog read endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use doc_store::DocumentStore;
use ledger::LedgerStore;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::bearer_identity;

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    pub store_id: String,
}

/// GET /api/products — list the catalog.
#[tracing::instrument(skip(state, headers))]
pub async fn list<L, D>(
    State(state): State<Arc<AppState<L, D>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProductResponse>>, ApiError>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    bearer_identity(&state, &headers)?;

    let products = state.docs.list_products().await?;
    Ok(Json(
        products
            .into_iter()
            .map(|p| ProductResponse {
                id: p.id.as_str().to_string(),
                name: p.name,
                sku: p.sku,
                price_cents: p.price.cents(),
                store_id: p.store_id.as_str().to_string(),
            })
            .collect(),
    ))
}
