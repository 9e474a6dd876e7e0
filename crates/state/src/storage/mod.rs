//! Persistent key-value storage abstraction.
//!
//! The state layer mirrors its in-memory cart and session to a durable,
//! asynchronous, string-keyed store that survives process restarts. The
//! store is an external collaborator: implementations decide about
//! durability and timeouts, the state layer imposes none itself.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Storage keys used by the state layer.
pub mod keys {
    /// Key for the opaque auth credential. Deleted on logout.
    pub const TOKEN: &str = "token";

    /// Key for the JSON-encoded array of cart lines. Absent means empty.
    pub const CART_ITEMS: &str = "cartItems";

    /// Key for the raw restaurant identifier. Absent means no restaurant.
    pub const RESTAURANT: &str = "restaurant";
}

/// Errors reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing document could not be decoded.
    #[error("Corrupt store document: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// Backend-specific failure.
    #[error("{0}")]
    Backend(String),
}

/// A durable, asynchronous, string-keyed store.
///
/// Reads tolerate absent keys by returning `None`. Writes are considered
/// durable once the returned future resolves.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete the value stored under `key`. Deleting an absent key is not
    /// an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}
