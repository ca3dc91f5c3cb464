//! reservation_enqueue and sync_run tool implementations.

use bistro_client::ServiceWorker;
use bistro_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the reservation_enqueue tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EnqueueParams {
    /// Reservation form fields as a JSON object.
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EnqueueOutput {
    pub id: i64,
}

/// Parameters for the sync_run tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncRunParams {
    /// Sync tag; only "reservation-sync" does anything.
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncRunOutput {
    pub tag: String,
    /// False when the tag was not recognized.
    pub handled: bool,
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

pub async fn enqueue_impl(worker: &ServiceWorker, params: EnqueueParams) -> Result<CallToolResult, McpError> {
    if !params.data.is_object() {
        return Err(Error::InvalidInput("reservation data must be a JSON object".into()).into());
    }
    let id = worker.enqueue_reservation(&params.data).await?;
    json_result(&EnqueueOutput { id })
}

pub async fn sync_impl(worker: &ServiceWorker, params: SyncRunParams) -> Result<CallToolResult, McpError> {
    let report = worker.handle_sync(&params.tag).await?;
    let handled = report.is_some();
    let report = report.unwrap_or_default();

    json_result(&SyncRunOutput {
        tag: params.tag,
        handled,
        attempted: report.attempted,
        synced: report.synced,
        failed: report.failed,
    })
}
