//! cache_purge tool implementation.
//!
//! Runs the stale-origin purge on demand: deletes entries whose URL contains
//! a marker, in one partition.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use otaku_core::{Error, Purpose};

use crate::tools::{Worker, json_result};

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Partition to purge (default: the current API partition).
    #[serde(default)]
    pub partition: Option<String>,

    /// Delete entries whose URL contains this text (default: every
    /// configured stale-origin marker).
    #[serde(default)]
    pub marker: Option<String>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    pub partition: String,
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(worker: &Worker, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let partition = params
        .partition
        .unwrap_or_else(|| worker.partitions().name(Purpose::Api).to_string());

    let markers = match params.marker {
        Some(marker) if marker.is_empty() => {
            return Err(Error::InvalidInput("marker cannot be empty".to_string()).into());
        }
        Some(marker) => vec![marker],
        None => worker.config().stale_origin_markers.clone(),
    };

    let mut deleted = 0u64;
    for marker in &markers {
        deleted += worker.store().purge_entries_matching(&partition, marker).await?;
    }
    tracing::info!(%partition, deleted, "manual purge");

    json_result(&CachePurgeOutput { partition, deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{parse, started_worker};
    use otaku_core::{CacheKey, CacheStore, Method, Response};

    async fn seed(worker: &Worker, url: &str) {
        let key = CacheKey::parse(Method::Get, url).unwrap();
        worker.store().put("otakudb-api-v1", &key, &Response::new(200, "{}")).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_default_markers() {
        let (worker, _) = started_worker().await;
        seed(&worker, "http://localhost:4000/anime/21").await;
        seed(&worker, "https://api.jikan.moe/v4/anime/21").await;

        let params = CachePurgeParams { partition: None, marker: None };
        let output: CachePurgeOutput = parse(&purge_impl(&worker, params).await.unwrap());

        assert_eq!(output.partition, "otakudb-api-v1");
        assert_eq!(output.deleted, 1);
        assert_eq!(worker.store().count("otakudb-api-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_explicit_marker() {
        let (worker, _) = started_worker().await;
        seed(&worker, "https://api.jikan.moe/v4/anime/21").await;
        seed(&worker, "https://api.jikan.moe/v4/seasons/now").await;

        let params = CachePurgeParams { partition: Some("otakudb-api-v1".into()), marker: Some("/seasons/".into()) };
        let output: CachePurgeOutput = parse(&purge_impl(&worker, params).await.unwrap());

        assert_eq!(output.deleted, 1);
    }

    #[tokio::test]
    async fn test_purge_empty_marker() {
        let (worker, _) = started_worker().await;
        let params = CachePurgeParams { partition: None, marker: Some(String::new()) };

        assert!(purge_impl(&worker, params).await.is_err());
    }
}
