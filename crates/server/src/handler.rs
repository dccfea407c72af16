//! MCP server handler implementation.
//!
//! Routes tool calls to the lookup, prefetch and cache tools.
use std::sync::Arc;

use crate::tools::{
    CachePurgeParams, LookupPlayerParams, PrefetchAvatarParams, lookup_impl, prefetch_impl, purge_impl,
};

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
use tierscope_client::{ImageWarmer, PlayerLookup};

/// The main MCP server handler for tierscope.
#[derive(Clone)]
pub struct TierscopeServer {
    tool_router: ToolRouter<Self>,
    lookup: PlayerLookup,
    warmer: Arc<dyn ImageWarmer>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl TierscopeServer {
    /// Create a new server handler.
    ///
    /// `warmer` serves explicit prefetch requests; whether lookups warm
    /// avatars on their own is decided by how `lookup` was built.
    pub fn new(lookup: PlayerLookup, warmer: Arc<dyn ImageWarmer>) -> Self {
        Self { tool_router: Self::tool_router(), lookup, warmer }
    }

    /// Look up a player's rankings by name or UUID.
    #[tool(
        description = "Look up a player's tier rankings by name or UUID. Results are cached for three minutes and API calls are paced to one per second."
    )]
    async fn lookup_player(&self, params: Parameters<LookupPlayerParams>) -> Result<CallToolResult, McpError> {
        lookup_impl(&self.lookup, params.0).await
    }

    /// Warm a player's avatar image in the background.
    #[tool(description = "Pre-load a player's avatar image in the background. Returns immediately.")]
    async fn prefetch_avatar(&self, params: Parameters<PrefetchAvatarParams>) -> Result<CallToolResult, McpError> {
        prefetch_impl(&self.warmer, self.lookup.links(), params.0)
    }

    /// Remove expired entries from the lookup cache.
    #[tool(description = "Delete expired entries from the lookup cache. Returns the number of entries removed.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(self.lookup.cache(), params.0).await
    }
}

impl ServerHandler for TierscopeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "tierscope".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some("Player tier-ranking lookups backed by a two-tier cache.".into()),
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
