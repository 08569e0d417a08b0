//! Key-value persistence backends for the offline queue.
//!
//! The queue only needs to read and replace one string blob per key. Every
//! backend here guarantees that a failed `write` leaves the previous value
//! readable.

mod file;
mod libsql_store;
mod memory;

pub use file::FileKeyValueStore;
pub use libsql_store::LibSqlKeyValueStore;
pub use memory::MemoryKeyValueStore;

use crate::error::Result;

/// Trait for string blob storage keyed by name (async)
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read the value stored under `key`, `None` when absent
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    async fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}
