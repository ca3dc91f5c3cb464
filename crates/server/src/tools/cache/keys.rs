//! cache_keys tool implementation.
//!
//! Lists the request URLs stored in one or all generations.

use bistro_core::{CacheDb, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::super::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Generation to list; all generations when omitted.
    #[serde(default)]
    pub cache: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationKeys {
    pub cache: String,
    pub keys: Vec<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub caches: Vec<GenerationKeys>,
}

pub async fn keys_impl(db: &CacheDb, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let names = match params.cache {
        Some(name) => {
            if !db.has_cache(&name).await? {
                return Err(Error::CacheMiss(format!("no cache named {name}")).into());
            }
            vec![name]
        }
        None => db.cache_names().await?,
    };

    let mut caches = Vec::with_capacity(names.len());
    for name in names {
        let keys = db.open_cache(&name).await?.keys().await?;
        caches.push(GenerationKeys { cache: name, keys });
    }

    json_result(&CacheKeysOutput { caches })
}
