//! cache_list tool implementation.
//!
//! Lists every stored partition with its entry count, flagging which ones
//! belong to the running version.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{Worker, json_result};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PartitionInfo {
    pub name: String,
    pub entries: u64,
    /// False for partitions activation would delete.
    pub current: bool,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    /// Partitions in creation order.
    pub partitions: Vec<PartitionInfo>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let partitions = worker
        .store()
        .summaries()
        .await?
        .into_iter()
        .map(|s| PartitionInfo { current: worker.partitions().is_current(&s.name), name: s.name, entries: s.entries })
        .collect();

    json_result(&CacheListOutput { partitions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{parse, started_worker};
    use otaku_core::{CacheKey, CacheStore, Method, Response};

    #[tokio::test]
    async fn test_list_after_start() {
        let (worker, _) = started_worker().await;

        let output: CacheListOutput = parse(&list_impl(&worker).await.unwrap());

        let static_partition = output.partitions.iter().find(|p| p.name == "otakudb-static-v1").unwrap();
        assert_eq!(static_partition.entries, 5);
        assert!(static_partition.current);
    }

    #[tokio::test]
    async fn test_list_flags_old_partitions() {
        let (worker, _) = started_worker().await;
        let key = CacheKey::parse(Method::Get, "http://localhost:8080/").unwrap();
        worker.store().put("otakudb-v1", &key, &Response::new(200, "old")).await.unwrap();

        let output: CacheListOutput = parse(&list_impl(&worker).await.unwrap());

        let legacy = output.partitions.iter().find(|p| p.name == "otakudb-v1").unwrap();
        assert!(!legacy.current);
        assert_eq!(legacy.entries, 1);
    }
}
