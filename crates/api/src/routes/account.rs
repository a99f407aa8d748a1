//! Authenticated account queries.

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

/// Five most recent movements, matching the original statement view.
const MOVEMENT_LIMIT: i64 = 5;

#[derive(Serialize)]
pub struct AccountInfoResponse {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub account_number: String,
    pub balance_cents: i64,
}

#[derive(Serialize)]
pub struct MovementResponse {
    pub id: i64,
    pub source_account: String,
    pub destination_account: String,
    pub amount_cents: i64,
    pub executed_at: String,
}

/// GET /api/me/info — the caller's name, account number, and balance.
#[tracing::instrument(skip(state, headers))]
pub async fn info<L, D>(
    State(state): State<Arc<AppState<L, D>>>,
    headers: HeaderMap,
) -> Result<Json<AccountInfoResponse>, ApiError>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    let identity = bearer_identity(&state, &headers)?;

    let user = state
        .ledger
        .find_user(&identity.username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", identity.username)))?;

    let account = state
        .ledger
        .get_account(&identity.national_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No account found for client {}", identity.national_id))
        })?;

    Ok(Json(AccountInfoResponse {
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        account_number: account.number.as_str().to_string(),
        balance_cents: account.balance.cents(),
    }))
}

/// GET /api/me/movements — the five most recent ledger movements on the
/// caller's account.
#[tracing::instrument(skip(state, headers))]
pub async fn movements<L, D>(
    State(state): State<Arc<AppState<L, D>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<MovementResponse>>, ApiError>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    let identity = bearer_identity(&state, &headers)?;

    let account = state
        .ledger
        .get_account(&identity.national_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No account found for client {}", identity.national_id))
        })?;

    let movements = state
        .ledger
        .recent_movements(&account.number, MOVEMENT_LIMIT)
        .await?;

    Ok(Json(
        movements
            .into_iter()
            .map(|m| MovementResponse {
                id: m.id,
                source_account: m.source.as_str().to_string(),
                destination_account: m.destination.as_str().to_string(),
                amount_cents: m.amount.cents(),
                executed_at: m.executed_at.to_rfc3339(),
            })
            .collect(),
    ))
}
