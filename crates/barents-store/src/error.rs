//! Error types for the sighting store.

/// Errors that can occur during sighting log operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database operation failed.
    #[error("sighting store database error: {0}")]
    Database(#[from] rusqlite::Error),
}
