//! cache_purge tool implementation.
//!
//! Drops expired entries from the durable cache tier.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tierscope_client::ProfileResult;
use tierscope_core::{Error, TtlCache};

/// Parameters for the cache_purge tool. It takes none.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &TtlCache<ProfileResult>, _params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let deleted = cache.purge_expired().await?;
    tracing::info!(deleted, "purged expired cache entries");

    let output = CachePurgeOutput { deleted };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::Serialization(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
