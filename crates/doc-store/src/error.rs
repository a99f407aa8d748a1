use common::CartKey;
use thiserror::Error;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum DocStoreError {
    /// A versioned cart write lost a race with a concurrent writer.
    /// Callers re-read the cart and retry.
    #[error("Version conflict writing cart {key}: expected version {expected}")]
    VersionConflict { key: CartKey, expected: u64 },

    /// An order with the same order number already exists.
    #[error("Duplicate order number: {0}")]
    DuplicateOrder(String),

    /// A MongoDB driver error occurred.
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// A document failed to serialize.
    #[error("Serialization error: {0}")]
    Serialize(#[from] mongodb::bson::ser::Error),

    /// A document failed to deserialize.
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] mongodb::bson::de::Error),

    /// The store is unreachable or failed internally.
    #[error("Document store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, DocStoreError>;
