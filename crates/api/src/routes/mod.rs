//! HTTP route handlers.

pub mod account;
pub mod auth;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod transfers;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use common::Identity;
use doc_store::DocumentStore;
use ledger::LedgerStore;

use crate::AppState;
use crate::error::ApiError;

/// Resolves the `Authorization: Bearer <token>` header to an identity.
pub(crate) fn bearer_identity<L, D>(
    state: &AppState<L, D>,
    headers: &HeaderMap,
) -> Result<Identity, ApiError>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?;

    state
        .auth
        .authenticate(token)
        .ok_or(ApiError::Unauthenticated)
}
