//! Peer transfer endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use common::{AccountNumber, Money};
use doc_store::DocumentStore;
use ledger::LedgerStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::bearer_identity;

#[derive(Deserialize)]
pub struct TransferRequest {
    pub source_account: String,
    pub destination_account: String,
    pub amount_cents: i64,
}

#[derive(Serialize)]
pub struct TransferResponse {
    pub source_account: String,
    pub destination_account: String,
    pub amount_cents: i64,
    pub status: &'static str,
}

/// POST /api/transfers — move money between accounts. The caller must own
/// the source account.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<L, D>(
    State(state): State<Arc<AppState<L, D>>>,
    headers: HeaderMap,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), ApiError>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    let identity = bearer_identity(&state, &headers)?;

    let source = AccountNumber::new(req.source_account.clone());
    let destination = AccountNumber::new(req.destination_account.clone());
    state
        .transfers
        .execute(&identity, &source, &destination, Money::from_cents(req.amount_cents))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            source_account: req.source_account,
            destination_account: req.destination_account,
            amount_cents: req.amount_cents,
            status: "COMPLETED",
        }),
    ))
}
