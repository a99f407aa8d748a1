//! Login endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Form, State};
use doc_store::DocumentStore;
use ledger::LedgerStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// POST /api/auth/login — verify credentials and issue a bearer token.
#[tracing::instrument(skip(state, req), fields(username = %req.username))]
pub async fn login<L, D>(
    State(state): State<Arc<AppState<L, D>>>,
    Form(req): Form<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    let access_token = state.auth.login(&req.username, &req.password).await?;
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
    }))
}
