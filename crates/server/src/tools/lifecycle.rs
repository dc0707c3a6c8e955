//! sw_install, sw_activate and sw_state tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use otaku_core::WorkerState;
use otaku_core::router::ActivationReport;

use super::{Worker, json_result};

/// Output structure for the sw_state and sw_install tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStateOutput {
    pub state: WorkerState,
    pub cache_version: String,
    pub origin: String,
    /// Partition names valid for this version.
    pub partitions: Vec<String>,
}

/// Output structure for the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateOutput {
    pub state: WorkerState,
    pub report: ActivationReport,
}

async fn snapshot(worker: &Worker) -> SwStateOutput {
    SwStateOutput {
        state: worker.state().await,
        cache_version: worker.config().cache_version.clone(),
        origin: worker.config().origin.clone(),
        partitions: worker.partitions().names().iter().map(|n| n.to_string()).collect(),
    }
}

/// Implementation of the sw_state tool.
pub async fn state_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    json_result(&snapshot(worker).await)
}

/// Implementation of the sw_install tool.
///
/// Allowed from `parsed` and `redundant`; a failed precache leaves the worker
/// `redundant` and returns the error.
pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    worker.install().await?;
    json_result(&snapshot(worker).await)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&SwActivateOutput { state: worker.state().await, report })
}
