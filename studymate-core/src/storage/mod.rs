//! Client-local durable key-value storage.
//!
//! Values are opaque strings; callers serialize their own payloads.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// A small durable string store local to the client
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written or was removed
    fn get(&self, key: &str) -> crate::Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> crate::Result<()>;

    /// Delete a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> crate::Result<()>;
}
