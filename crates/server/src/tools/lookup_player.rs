//! lookup_player tool implementation.
//!
//! Resolves a player name or id through the cached, rate-limited lookup.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tierscope_client::{PlayerLookup, ProfileResult};

use crate::error::ErrorBody;

/// Input parameters for lookup_player tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LookupPlayerParams {
    /// Player name or UUID.
    pub name: String,
}

/// Successful lookup envelope.
#[derive(Debug, Clone, Serialize)]
pub struct LookupSuccess {
    pub ok: bool,
    pub data: ProfileResult,
    /// Present (and true) only when the profile came from the cache.
    #[serde(rename = "fromCache", skip_serializing_if = "Option::is_none")]
    pub from_cache: Option<bool>,
}

/// Failed lookup envelope.
#[derive(Debug, Clone, Serialize)]
pub struct LookupFailure {
    pub error: ErrorBody,
}

/// Implementation of the lookup_player tool.
///
/// Always returns `Ok`: lookup failures are reported as an error envelope
/// with `is_error` set.
pub async fn lookup_impl(lookup: &PlayerLookup, params: LookupPlayerParams) -> Result<CallToolResult, McpError> {
    match lookup.lookup(&params.name).await {
        Ok(found) => {
            let output =
                LookupSuccess { ok: true, data: found.profile, from_cache: found.from_cache.then_some(true) };
            Ok(CallToolResult::success(vec![Content::text(
                serde_json::to_string_pretty(&output).unwrap_or_default(),
            )]))
        }
        Err(e) => {
            tracing::debug!(name = %params.name, kind = %e.kind(), error = %e, "lookup failed");
            let output = LookupFailure { error: ErrorBody::from(&e) };
            Ok(CallToolResult::error(vec![Content::text(
                serde_json::to_string_pretty(&output).unwrap_or_default(),
            )]))
        }
    }
}
