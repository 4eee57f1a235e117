//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.
//! The process serves exactly one session.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult, run_rmcp_session};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        run_rmcp_session(service, "stdio").await?;

        info!("STDIO transport finished");
        Ok(())
    }
}
