//! push_message and notification_click tool implementations.

use bistro_client::{NotificationData, ServiceWorker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the push_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushMessageParams {
    /// Raw push payload, normally `{"title", "body", "data": {"url"}}` as JSON text.
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushMessageOutput {
    /// False when the payload was empty or malformed.
    pub shown: bool,
    /// The displayed notification.
    pub notification: Option<serde_json::Value>,
}

/// Parameters for the notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// Action that was clicked ("view", "dismiss"), if any.
    #[serde(default)]
    pub action: Option<String>,

    /// The notification's `data.url`.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickOutput {
    /// Window that was opened, if any.
    pub opened: Option<String>,
}

pub async fn push_impl(worker: &ServiceWorker, params: PushMessageParams) -> Result<CallToolResult, McpError> {
    let notification = worker.handle_push(params.payload.as_deref().map(str::as_bytes)).await?;
    let notification = notification
        .map(|n| serde_json::to_value(&n))
        .transpose()
        .map_err(bistro_core::Error::from)?;

    json_result(&PushMessageOutput { shown: notification.is_some(), notification })
}

pub async fn click_impl(worker: &ServiceWorker, params: NotificationClickParams) -> Result<CallToolResult, McpError> {
    let data = NotificationData { url: params.url };
    let opened = worker.handle_notification_click(params.action.as_deref(), &data).await?;
    json_result(&NotificationClickOutput { opened })
}
