//! prefetch_avatar tool implementation.
//!
//! Fire-and-forget: schedules avatar warming and returns immediately.

use std::sync::Arc;

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tierscope_client::{ImageWarmer, ProfileLinks, spawn_warm};

/// Input parameters for prefetch_avatar tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PrefetchAvatarParams {
    /// Player id.
    pub id: String,

    /// Explicit image URL. Derived from the avatar template when omitted.
    #[serde(default, rename = "imageUrl", alias = "image_url")]
    pub image_url: Option<String>,
}

/// Implementation of the prefetch_avatar tool.
pub fn prefetch_impl(
    warmer: &Arc<dyn ImageWarmer>, links: &ProfileLinks, params: PrefetchAvatarParams,
) -> Result<CallToolResult, McpError> {
    let id = params.id.trim().to_string();
    let url = match params.image_url.filter(|u| !u.trim().is_empty()) {
        Some(url) => Some(url),
        None if !id.is_empty() => Some(links.avatar_url(&id)),
        None => None,
    };

    match url {
        Some(url) => {
            spawn_warm(Arc::clone(warmer), id, url);
        }
        None => tracing::debug!("prefetch_avatar called without id or imageUrl"),
    }

    Ok(CallToolResult::success(vec![]))
}
