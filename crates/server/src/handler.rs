//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheGetParams, CacheKeysParams, get_impl, keys_impl},
    lifecycle::{activate_impl, install_impl, state_impl},
    push::{NotificationClickParams, PushMessageParams, click_impl, push_impl},
    sw_fetch::{SwFetchParams, fetch_impl},
    sync::{EnqueueParams, SyncRunParams, enqueue_impl, sync_impl},
};
use bistro_client::ServiceWorker;

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

/// The main MCP server handler for the offline worker.
#[derive(Clone)]
pub struct McpWorkerServer {
    worker: Arc<ServiceWorker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl McpWorkerServer {
    /// Create a new server handler around a worker.
    pub fn new(worker: Arc<ServiceWorker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(description = "Route a request through the offline worker (network-first, cache-first or stale-while-revalidate, with offline fallbacks).")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Install the worker: fetch every static file into the static cache. Fails if any file is unreachable.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Activate the worker: delete every cache generation that is not current.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    #[tool(description = "Report the worker lifecycle state and the cache generations in storage.")]
    async fn sw_state(&self) -> Result<CallToolResult, McpError> {
        state_impl(&self.worker).await
    }

    #[tool(description = "List cached request URLs for one generation or all of them.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(self.worker.storage(), params.0).await
    }

    #[tool(description = "Read a cached GET response by URL from any generation.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, params.0).await
    }

    #[tool(description = "Queue a reservation submitted while offline for background sync.")]
    async fn reservation_enqueue(&self, params: Parameters<EnqueueParams>) -> Result<CallToolResult, McpError> {
        enqueue_impl(&self.worker, params.0).await
    }

    #[tool(description = "Run background sync for a tag. \"reservation-sync\" posts queued reservations.")]
    async fn sync_run(&self, params: Parameters<SyncRunParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push message payload and show its notification.")]
    async fn push_message(&self, params: Parameters<PushMessageParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Handle a notification click; the \"view\" action opens the notification's URL.")]
    async fn notification_click(&self, params: Parameters<NotificationClickParams>) -> Result<CallToolResult, McpError> {
        click_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for McpWorkerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "bistro-sw".into(),
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
