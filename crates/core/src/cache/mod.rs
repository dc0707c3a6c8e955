//! Partitioned response cache.
//!
//! Partitions are named buckets of request -> response pairs. The router
//! only talks to the [`CacheStore`] trait; two backends implement it:
//!
//! - [`MemoryStore`] for tests and throwaway hosts
//! - [`CacheDb`], SQLite with async access via tokio-rusqlite, WAL mode and
//!   automatic schema migrations

pub mod connection;
pub mod entries;
pub mod hash;
pub mod key;
pub mod memory;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::PartitionSummary;
pub use key::{CacheKey, UrlError, canonicalize};
pub use memory::MemoryStore;

use crate::http::Response;

/// Async key-value storage for cache partitions.
///
/// Implementations must tolerate concurrent calls for independent keys.
/// Writes to the same key are last-write-wins; no operation spans more than
/// one key except [`CacheStore::put_all`], which is all-or-nothing.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the partition if it does not exist yet.
    async fn open(&self, partition: &str) -> Result<(), Error>;

    /// Partition names in creation order.
    async fn partitions(&self) -> Result<Vec<String>, Error>;

    /// Drop a partition with all of its entries. Returns false if it did not exist.
    async fn delete_partition(&self, partition: &str) -> Result<bool, Error>;

    /// Store `response` under `key`, creating the partition lazily.
    async fn put(&self, partition: &str, key: &CacheKey, response: &Response) -> Result<(), Error>;

    /// Store every entry or none of them.
    async fn put_all(&self, partition: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error>;

    async fn get(&self, partition: &str, key: &CacheKey) -> Result<Option<Response>, Error>;

    /// First match for `key` across all partitions, oldest partition first.
    async fn match_any(&self, key: &CacheKey) -> Result<Option<Response>, Error>;

    async fn keys(&self, partition: &str) -> Result<Vec<CacheKey>, Error>;

    async fn delete(&self, partition: &str, key: &CacheKey) -> Result<bool, Error>;

    async fn count(&self, partition: &str) -> Result<u64, Error>;
}
