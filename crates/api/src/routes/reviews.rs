//! Application review endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use doc_store::DocumentStore;
use domain::Review;
use ledger::LedgerStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::bearer_identity;

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub score: u8,
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub review_id: String,
}

/// POST /api/reviews — submit a score-and-comment review.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<L, D>(
    State(state): State<Arc<AppState<L, D>>>,
    headers: HeaderMap,
    Json(req): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError>
where
    L: LedgerStore + Clone,
    D: DocumentStore + Clone,
{
    let identity = bearer_identity(&state, &headers)?;

    let review = Review::new(
        identity.national_id.clone(),
        identity.username.clone(),
        req.score,
        req.comment,
    )?;
    let review_id = state.docs.insert_review(&review).await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse { review_id })))
}
