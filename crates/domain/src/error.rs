//! Domain error types.

use thiserror::Error;

/// Errors raised by domain-level validation.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Item quantity must be strictly positive.
    #[error("Invalid quantity: {quantity} (must be greater than zero)")]
    InvalidQuantity { quantity: i64 },

    /// Review score outside the accepted range.
    #[error("Invalid score: {score} (must be between 1 and 10)")]
    InvalidScore { score: i64 },
}
