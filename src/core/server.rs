//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the tools domain.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool.
//! The base list lives in `domains/tools/registry.rs`; the server only
//! builds the registry once, wraps it in a dispatch engine and forwards
//! list and call requests to it. **Adding a new tool does NOT require
//! modifying this file!**

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::config::Config;
use super::error::Result;
use crate::domains::tools::{
    CapabilityRegistry, DiscoveryNotifier, DispatchEngine, ToolCapability, ToolListing,
    ToolsetConfig, base_capabilities,
};

/// The main MCP server handler.
///
/// Cloning is cheap: all clones share the same engine and notifier, so every
/// transport session sees the same toolset.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool listing and invocation.
    engine: Arc<DispatchEngine>,

    /// List-changed broadcasts to connected sessions.
    notifier: Arc<DiscoveryNotifier>,
}

impl McpServer {
    /// Create a new MCP server with the built-in git tools.
    ///
    /// Fails if any tool definition is malformed or two tools share a name.
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let capabilities = base_capabilities(config.clone())?;
        Self::build(config, capabilities)
    }

    /// Create a server over an explicit capability list.
    pub fn with_capabilities(config: Config, capabilities: Vec<ToolCapability>) -> Result<Self> {
        Self::build(Arc::new(config), capabilities)
    }

    fn build(config: Arc<Config>, capabilities: Vec<ToolCapability>) -> Result<Self> {
        let registry = CapabilityRegistry::new(capabilities, config.toolset.clone())?;
        info!(
            "Registered {} tools ({} visible)",
            registry.len(),
            registry.list().len()
        );

        let engine = DispatchEngine::new(registry, config.server.instructions.clone());
        let notifier = DiscoveryNotifier::new(config.discovery);

        Ok(Self {
            config,
            engine: Arc::new(engine),
            notifier: Arc::new(notifier),
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn engine(&self) -> &Arc<DispatchEngine> {
        &self.engine
    }

    pub fn notifier(&self) -> &Arc<DiscoveryNotifier> {
        &self.notifier
    }

    /// List the visible tools together with the server instructions.
    pub fn list_tools(&self) -> ToolListing {
        self.engine.list()
    }

    /// Call a tool by name.
    ///
    /// Unknown tools and invalid arguments are protocol errors; a failing
    /// tool is an `isError` result.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> std::result::Result<CallToolResult, McpError> {
        self.engine
            .invoke(name, arguments)
            .await
            .or_else(|e| e.into_call_result())
    }

    /// Re-evaluate the base tools under a new toolset.
    ///
    /// Connected sessions are notified only if the visible tool list actually
    /// changed. Returns the number of sessions notified.
    #[instrument(skip(self))]
    pub async fn reconfigure_toolset(&self, toolset: ToolsetConfig) -> usize {
        if !self.engine.reconfigure(toolset) {
            debug!("Visible tools unchanged, nothing to notify");
            return 0;
        }
        info!("Toolset reconfigured");
        self.notifier.notify_tool_list_changed().await
    }

    /// Handshake information advertised to clients.
    pub fn server_info(&self) -> ServerInfo {
        let capabilities = if self.notifier.is_enabled() {
            ServerCapabilities::builder()
                .enable_tools()
                .enable_tool_list_changed()
                .build()
        } else {
            ServerCapabilities::builder().enable_tools().build()
        };

        ServerInfo {
            instructions: self.engine.instructions().map(str::to_string),
            capabilities,
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        self.server_info()
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        debug!("Listing tools");
        let listing = self.list_tools();
        let meta = listing.instructions.map(|instructions| {
            let mut meta = JsonObject::new();
            meta.insert(
                "instructions".to_string(),
                serde_json::Value::String(instructions),
            );
            Meta(meta)
        });

        Ok(ListToolsResult {
            tools: listing.tools,
            next_cursor: None,
            meta,
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        McpServer::call_tool(self, &request.name, request.arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::{SessionSink, TransportError};
    use crate::domains::tools::definitions::git::test_support::init_repo;
    use crate::domains::tools::definitions::git::GitStatusParams;
    use crate::domains::tools::{SchemaError, ToolDefinition, ToolHints, ToolOutcome, ToolsetMode};
    use crate::Error;
    use async_trait::async_trait;
    use rmcp::model::RawContent;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const DESTRUCTIVE: [&str; 2] = ["git_checkout_branch", "git_commit"];

    fn server_with(toolset: ToolsetConfig, discovery: bool) -> McpServer {
        let mut config = Config::default();
        config.toolset = toolset;
        config.discovery.enabled = discovery;
        McpServer::new(config).unwrap()
    }

    fn names(server: &McpServer) -> Vec<String> {
        server
            .list_tools()
            .tools
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect()
    }

    fn args(value: serde_json::Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    fn text(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            RawContent::Text(text) => &text.text,
            other => panic!("expected text content, got {other:?}"),
        }
    }

    #[derive(Default)]
    struct CountingSink {
        received: AtomicUsize,
    }

    #[async_trait]
    impl SessionSink for CountingSink {
        async fn notify_tool_list_changed(&self) -> std::result::Result<(), TransportError> {
            self.received.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_all_mode_lists_base_tools() {
        let server = server_with(ToolsetConfig::default(), false);
        assert_eq!(
            names(&server),
            vec![
                "find_git_repositories",
                "get_git_status",
                "get_current_branch",
                "get_git_log",
                "get_git_diff",
                "git_checkout_branch",
                "git_commit",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_only_hides_destructive_tools() {
        let server = server_with(ToolsetConfig::new(ToolsetMode::ReadOnly), false);
        let listed = names(&server);

        for name in DESTRUCTIVE {
            assert!(!listed.iter().any(|n| n == name));

            let err = server
                .call_tool(name, args(json!({ "path": "." })))
                .await
                .unwrap_err();
            assert_eq!(err.code.0, -32602);
            assert_eq!(err.data.unwrap()["kind"], "NotFound");
        }
    }

    #[tokio::test]
    async fn test_allow_list_restricts_listing_and_calls() {
        let toolset =
            ToolsetConfig::default().with_available_tools(["get_current_branch", "no_such_tool"]);
        let server = server_with(toolset, false);
        assert_eq!(names(&server), vec!["get_current_branch"]);

        let err = server
            .call_tool("get_git_status", args(json!({ "path": "." })))
            .await
            .unwrap_err();
        assert_eq!(err.data.unwrap()["kind"], "NotFound");
    }

    #[tokio::test]
    async fn test_missing_required_field_names_it() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let schema = json!({
            "type": "object",
            "properties": { "path": { "type": "string" } },
            "required": ["path"]
        });
        let definition = ToolDefinition::new(
            "inspect",
            "Inspect a path",
            Arc::new(schema.as_object().cloned().unwrap()),
            ToolHints::read_only("Inspect"),
        )
        .unwrap();
        let capability = ToolCapability::new(definition, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { ToolOutcome::Ok(Vec::new()) }
        });
        let server = McpServer::with_capabilities(Config::default(), vec![capability]).unwrap();

        let err = server.call_tool("inspect", None).await.unwrap_err();
        let data = err.data.unwrap();
        assert_eq!(data["kind"], "ValidationError");
        assert_eq!(data["path"], "path");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let first = ToolCapability::typed(
            "twin",
            "first",
            ToolHints::read_only("Twin"),
            |_: GitStatusParams| async { ToolOutcome::Ok(Vec::new()) },
        )
        .unwrap();
        let second = first.clone();

        let result = McpServer::with_capabilities(Config::default(), vec![first, second]);
        assert!(matches!(
            result,
            Err(Error::Schema(SchemaError::DuplicateName(name))) if name == "twin"
        ));
    }

    #[tokio::test]
    async fn test_git_tools_through_dispatch() {
        let temp_dir = TempDir::new().unwrap();
        init_repo(temp_dir.path(), 3);
        let path = temp_dir.path().to_string_lossy().to_string();
        let server = server_with(ToolsetConfig::default(), false);

        let branch = server
            .call_tool("get_current_branch", args(json!({ "path": path })))
            .await
            .unwrap();
        assert_eq!(text(&branch), "main");

        let log = server
            .call_tool("get_git_log", args(json!({ "path": path, "maxCount": 2 })))
            .await
            .unwrap();
        assert_eq!(text(&log).split('\n').count(), 2);

        let err = server
            .call_tool("get_git_log", args(json!({ "path": path, "maxCount": 0 })))
            .await
            .unwrap_err();
        assert_eq!(err.data.unwrap()["path"], "maxCount");
    }

    #[tokio::test]
    async fn test_null_for_optional_tool_argument() {
        let temp_dir = TempDir::new().unwrap();
        init_repo(temp_dir.path(), 1);
        std::fs::write(temp_dir.path().join("file.txt"), "changed\n").unwrap();
        let path = temp_dir.path().to_string_lossy().to_string();
        let server = server_with(ToolsetConfig::default(), false);

        let diff = server
            .call_tool("get_git_diff", args(json!({ "path": path, "file": null })))
            .await
            .unwrap();
        assert_ne!(diff.is_error, Some(true));
        assert!(text(&diff).contains("+changed"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_result() {
        let temp_dir = TempDir::new().unwrap();
        let server = server_with(ToolsetConfig::default(), false);

        let result = server
            .call_tool(
                "get_git_status",
                args(json!({ "path": temp_dir.path().to_string_lossy() })),
            )
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            result.structured_content.unwrap()["kind"],
            "ToolExecutionError"
        );
    }

    #[tokio::test]
    async fn test_reconfigure_notifies_every_session() {
        let server = server_with(ToolsetConfig::default(), true);
        let first = Arc::new(CountingSink::default());
        let second = Arc::new(CountingSink::default());
        server.notifier().attach(first.clone()).await;
        server.notifier().attach(second.clone()).await;

        let notified = server
            .reconfigure_toolset(ToolsetConfig::new(ToolsetMode::ReadOnly))
            .await;
        assert_eq!(notified, 2);
        assert_eq!(first.received.load(Ordering::SeqCst), 1);
        assert_eq!(second.received.load(Ordering::SeqCst), 1);
        assert!(!names(&server).iter().any(|n| n == "git_commit"));
    }

    #[tokio::test]
    async fn test_equivalent_toolset_sends_nothing() {
        let server = server_with(ToolsetConfig::new(ToolsetMode::ReadOnly), true);
        let sink = Arc::new(CountingSink::default());
        server.notifier().attach(sink.clone()).await;

        // Allow-listing exactly the visible tools leaves the listing unchanged.
        let visible = names(&server);
        let equivalent = ToolsetConfig::new(ToolsetMode::ReadOnly).with_available_tools(visible);

        assert_eq!(server.reconfigure_toolset(equivalent).await, 0);
        assert_eq!(sink.received.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_server_info_advertises_list_changed() {
        let enabled = server_with(ToolsetConfig::default(), true).server_info();
        let tools = enabled.capabilities.tools.unwrap();
        assert_eq!(tools.list_changed, Some(true));

        let disabled = server_with(ToolsetConfig::default(), false).server_info();
        assert_ne!(disabled.capabilities.tools.unwrap().list_changed, Some(true));
        assert_eq!(disabled.server_info.name, "git-mcp-server");
    }
}
