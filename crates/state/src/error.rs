//! Unified error handling for the state layer.
//!
//! Cart mutation errors propagate to the caller as explicit failures.
//! Side-channel errors (analytics, cache eviction during logout, storage
//! writes that follow an already-applied memory mutation) are logged via
//! `tracing` and swallowed - they must never fail the primary operation.

use thiserror::Error;

use tiffin_core::LineKey;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Errors surfaced by cart and session operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// A mutation referenced a cart line key that does not exist.
    #[error("Cart line not found: {0}")]
    NotFound(LineKey),

    /// The persisted cart failed to parse as the expected JSON encoding.
    ///
    /// Surfaced rather than treated as an empty cart: silently discarding
    /// a user's cart is a worse outcome than a visible error.
    #[error("Malformed persisted cart: {0}")]
    MalformedCart(#[source] serde_json::Error),

    /// A storage read failed while hydrating state.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The profile API request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Result type alias for `StateError`.
pub type Result<T> = std::result::Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_error_display() {
        let err = StateError::NotFound(LineKey::new("abc-123"));
        assert_eq!(err.to_string(), "Cart line not found: abc-123");

        let err = StateError::Storage(StorageError::Backend("disk full".to_string()));
        assert_eq!(err.to_string(), "Storage error: disk full");
    }
}
