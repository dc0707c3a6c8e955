//! In-memory cache storage.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{CacheKey, CacheStore};
use crate::Error;
use crate::http::Response;

struct Partition {
    name: String,
    entries: HashMap<CacheKey, Response>,
}

/// In-memory partitions behind a tokio RwLock.
///
/// Cloning shares the underlying storage.
#[derive(Clone, Default)]
pub struct MemoryStore {
    partitions: Arc<RwLock<Vec<Partition>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_mut<'a>(partitions: &'a mut Vec<Partition>, name: &str) -> &'a mut Partition {
    match partitions.iter().position(|p| p.name == name) {
        Some(idx) => &mut partitions[idx],
        None => {
            partitions.push(Partition { name: name.to_string(), entries: HashMap::new() });
            let last = partitions.len() - 1;
            &mut partitions[last]
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, partition: &str) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        find_mut(&mut partitions, partition);
        Ok(())
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().map(|p| p.name.clone()).collect())
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool, Error> {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|p| p.name != partition);
        Ok(partitions.len() != before)
    }

    async fn put(&self, partition: &str, key: &CacheKey, response: &Response) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        find_mut(&mut partitions, partition)
            .entries
            .insert(key.clone(), response.clone());
        Ok(())
    }

    async fn put_all(&self, partition: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        find_mut(&mut partitions, partition).entries.extend(entries);
        Ok(())
    }

    async fn get(&self, partition: &str, key: &CacheKey) -> Result<Option<Response>, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|p| p.name == partition)
            .and_then(|p| p.entries.get(key).cloned()))
    }

    async fn match_any(&self, key: &CacheKey) -> Result<Option<Response>, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().find_map(|p| p.entries.get(key).cloned()))
    }

    async fn keys(&self, partition: &str) -> Result<Vec<CacheKey>, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|p| p.name == partition)
            .map(|p| p.entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, partition: &str, key: &CacheKey) -> Result<bool, Error> {
        let mut partitions = self.partitions.write().await;
        Ok(partitions
            .iter_mut()
            .find(|p| p.name == partition)
            .is_some_and(|p| p.entries.remove(key).is_some()))
    }

    async fn count(&self, partition: &str) -> Result<u64, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|p| p.name == partition)
            .map_or(0, |p| p.entries.len() as u64))
    }
}
