//! MCP tool implementations.
//!
//! Each tool feeds one router event into the shared [`Worker`] and reports
//! the outcome as pretty-printed JSON.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod notify;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use otaku_core::{CacheDb, Error, Network, ServiceWorker};

/// The router the host drives: SQLite-backed, with the transport chosen at
/// startup.
pub type Worker = ServiceWorker<CacheDb, Arc<dyn Network>>;

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
