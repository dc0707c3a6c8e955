//! Notification bridge tools: sw_push, sw_post_message,
//! sw_notification_click, sw_periodic_sync and sw_notifications.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use otaku_core::notify::{Notification, WindowClient};

use super::{Worker, json_result};

/// Input parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push payload text, normally a JSON object with title, body, url,
    /// animeId and tag. Omit for an empty push.
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushOutput {
    /// The notification shown, or null when the payload was ignored.
    pub shown: Option<Notification>,
}

/// Input parameters for the sw_post_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPostMessageParams {
    /// Message as posted by the page, e.g.
    /// `{"type":"SCHEDULE_NOTIFICATION","title":"...","delay":60000,"animeId":21}`.
    pub message: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPostMessageOutput {
    /// Whether a notification timer was started.
    pub scheduled: bool,
}

/// Input parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Tag of the clicked notification.
    pub tag: String,

    /// Action button pressed ("open" or "dismiss"); omit for a body click.
    #[serde(default)]
    pub action: Option<String>,
}

/// Input parameters for the sw_periodic_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPeriodicSyncParams {
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPeriodicSyncOutput {
    pub handled: bool,
}

/// Output structure for the sw_notifications tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationsOutput {
    /// Visible notifications, oldest first.
    pub notifications: Vec<Notification>,
    /// Open app windows.
    pub windows: Vec<WindowClient>,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(worker: &Worker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let shown = worker.push(params.payload.as_deref().map(str::as_bytes)).await?;
    json_result(&SwPushOutput { shown })
}

/// Implementation of the sw_post_message tool.
///
/// The timer runs detached on the host runtime and is lost if the process
/// exits first.
pub async fn post_message_impl(worker: &Worker, params: SwPostMessageParams) -> Result<CallToolResult, McpError> {
    let scheduled = worker.message(&params.message).is_some();
    json_result(&SwPostMessageOutput { scheduled })
}

/// Implementation of the sw_notification_click tool.
pub async fn click_impl(worker: &Worker, params: SwNotificationClickParams) -> Result<CallToolResult, McpError> {
    let action = worker
        .notification_click(&params.tag, params.action.as_deref())
        .await?;
    json_result(&action)
}

/// Implementation of the sw_periodic_sync tool.
pub async fn periodic_sync_impl(worker: &Worker, params: SwPeriodicSyncParams) -> Result<CallToolResult, McpError> {
    let handled = worker.periodic_sync(&params.tag).await;
    json_result(&SwPeriodicSyncOutput { handled })
}

/// Implementation of the sw_notifications tool.
pub async fn list_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let output = SwNotificationsOutput {
        notifications: worker.notifications().visible().await,
        windows: worker.clients().match_windows().await,
    };
    json_result(&output)
}
