//! sw_install, sw_activate and sw_state tool implementations.

use bistro_client::{ServiceWorker, WorkerState};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    pub state: String,
    /// Static generation that was filled.
    pub cache: String,
    /// Number of manifest entries stored.
    pub cached: usize,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    pub state: String,
    /// Generations removed.
    pub deleted: Vec<String>,
    /// Generations that could not be removed.
    pub failed: Vec<String>,
}

/// Output from the sw_state tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StateOutput {
    pub state: String,
    pub origin: String,
    /// Every generation currently in storage, oldest first.
    pub caches: Vec<String>,
}

fn state_name(state: WorkerState) -> String {
    state.to_string()
}

pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    json_result(&InstallOutput { state: state_name(worker.state()), cache: report.cache, cached: report.cached })
}

pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&ActivateOutput { state: state_name(worker.state()), deleted: report.deleted, failed: report.failed })
}

pub async fn state_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let caches = worker.storage().cache_names().await?;
    json_result(&StateOutput { state: state_name(worker.state()), origin: worker.origin().to_string(), caches })
}
