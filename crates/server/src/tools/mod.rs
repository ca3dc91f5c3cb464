//! MCP tool implementations.
//!
//! Each tool drives the shared [`ServiceWorker`](bistro_client::ServiceWorker)
//! and returns pretty-printed JSON.

pub mod cache;
pub mod lifecycle;
pub mod push;
pub mod sw_fetch;
pub mod sync;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::SerializeFailed(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
