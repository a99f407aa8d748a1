//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use doc_store::DocStoreError;
use domain::DomainError;
use ledger::LedgerError;

use crate::auth::AuthError;

/// API-level error type that maps to HTTP responses.
///
/// Every response body is `{"error": <message>, "code": <stable code>}`;
/// clients branch on `code`, not on the message text.
#[derive(Debug)]
pub enum ApiError {
    /// Missing, invalid, or expired bearer token.
    Unauthenticated,
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Login failure.
    Auth(AuthError),
    /// Cart, transfer, or checkout failure.
    Checkout(CheckoutError),
    /// Ledger store failure outside a checkout flow.
    Ledger(LedgerError),
    /// Document store failure outside a checkout flow.
    Store(DocStoreError),
    /// Domain validation failure.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Missing or invalid bearer token".to_string(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", msg),
            ApiError::Auth(err) => {
                let (status, code) = auth_error_status(&err);
                (status, code, err.to_string())
            }
            ApiError::Checkout(err) => {
                let (status, code) = checkout_error_status(&err);
                (status, code, err.to_string())
            }
            ApiError::Ledger(err) => {
                let (status, code) = ledger_error_status(&err);
                (status, code, err.to_string())
            }
            ApiError::Store(err) => {
                let (status, code) = store_error_status(&err);
                (status, code, err.to_string())
            }
            ApiError::Domain(err) => (StatusCode::BAD_REQUEST, "VALIDATION", err.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(%status, code, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

fn auth_error_status(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
        AuthError::MalformedHash => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        AuthError::Ledger(ledger_err) => ledger_error_status(ledger_err),
    }
}

fn checkout_error_status(err: &CheckoutError) -> (StatusCode, &'static str) {
    match err {
        CheckoutError::CartEmpty => (StatusCode::BAD_REQUEST, "CART_EMPTY"),
        CheckoutError::InsufficientFunds { .. } => {
            (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS")
        }
        CheckoutError::MissingPayoutAccount(_) => {
            (StatusCode::BAD_REQUEST, "MISSING_PAYOUT_ACCOUNT")
        }
        CheckoutError::AccountNotFound(_) | CheckoutError::ProductNotFound(_) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        }
        CheckoutError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        CheckoutError::PartialFailure { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "PARTIAL_FAILURE")
        }
        CheckoutError::CleanupFailed { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "CLEANUP_FAILED")
        }
        CheckoutError::Domain(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
        CheckoutError::Ledger(ledger_err) => ledger_error_status(ledger_err),
        CheckoutError::Store(store_err) => store_error_status(store_err),
    }
}

fn ledger_error_status(err: &LedgerError) -> (StatusCode, &'static str) {
    match err {
        LedgerError::InsufficientFunds { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS"),
        LedgerError::InvalidAccount(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        LedgerError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
        LedgerError::Database(_) | LedgerError::Migration(_) | LedgerError::Unavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
        }
    }
}

fn store_error_status(err: &DocStoreError) -> (StatusCode, &'static str) {
    match err {
        DocStoreError::VersionConflict { .. } | DocStoreError::DuplicateOrder(_) => {
            (StatusCode::CONFLICT, "CONFLICT")
        }
        DocStoreError::Database(_)
        | DocStoreError::Serialize(_)
        | DocStoreError::Deserialize(_)
        | DocStoreError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<DocStoreError> for ApiError {
    fn from(err: DocStoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
