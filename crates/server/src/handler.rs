//! MCP server handler implementation.
//!
//! Routes tool calls to the router event they stand for. Every tool shares
//! one worker, so cache state and visible notifications persist across calls.
use std::sync::Arc;

use crate::tools::{
    Worker,
    cache::{CachePurgeParams, list_impl, purge_impl},
    fetch::{SwFetchParams, fetch_impl},
    lifecycle::{activate_impl, install_impl, state_impl},
    notify::{
        self, SwNotificationClickParams, SwPeriodicSyncParams, SwPostMessageParams, SwPushParams, click_impl,
        periodic_sync_impl, post_message_impl, push_impl,
    },
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for otaku-sw.
#[derive(Clone)]
pub struct OtakuServer {
    worker: Arc<Worker>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl OtakuServer {
    pub fn new(worker: Arc<Worker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Route a request through the offline cache router. Returns the worker state, the route taken (bypass, api, cdn_image, static_asset, navigation, default; null before activation) and the response status, headers and body."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Precache the app shell. Allowed when the worker is parsed or redundant.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(
        description = "Activate an installed worker: delete partitions from other versions, purge stale-origin API entries and claim open windows."
    )]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    #[tool(description = "Report the worker lifecycle state, cache version and valid partition names.")]
    async fn sw_state(&self) -> Result<CallToolResult, McpError> {
        state_impl(&self.worker).await
    }

    #[tool(description = "Deliver a push message. The payload is JSON with optional title, body, url, animeId and tag.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a page message to the worker. SCHEDULE_NOTIFICATION starts a notification timer.")]
    async fn sw_post_message(&self, params: Parameters<SwPostMessageParams>) -> Result<CallToolResult, McpError> {
        post_message_impl(&self.worker, params.0).await
    }

    #[tool(
        description = "Click a visible notification, optionally on an action button. Closes it, then focuses or opens an app window."
    )]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.worker, params.0).await
    }

    #[tool(description = "Fire a periodic background sync with the given tag.")]
    async fn sw_periodic_sync(&self, params: Parameters<SwPeriodicSyncParams>) -> Result<CallToolResult, McpError> {
        periodic_sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "List visible notifications and open app windows.")]
    async fn sw_notifications(&self) -> Result<CallToolResult, McpError> {
        notify::list_impl(&self.worker).await
    }

    #[tool(description = "List cache partitions with entry counts.")]
    async fn cache_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.worker).await
    }

    #[tool(description = "Delete cache entries whose URL contains a marker. Defaults to the stale-origin markers in the API partition.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for OtakuServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "otaku-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StubNetwork, worker};

    #[tokio::test]
    async fn test_lists_every_tool() {
        let server = OtakuServer::new(worker(Arc::new(StubNetwork::default())).await);
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "cache_list",
                "cache_purge",
                "sw_activate",
                "sw_fetch",
                "sw_install",
                "sw_notification_click",
                "sw_notifications",
                "sw_periodic_sync",
                "sw_post_message",
                "sw_push",
                "sw_state",
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let server = OtakuServer::new(worker(Arc::new(StubNetwork::default())).await);
        assert_eq!(server.get_info().server_info.name, "otaku-sw");
    }
}
