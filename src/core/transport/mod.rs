//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **STDIO**: Standard input/output (default for MCP) - feature: `stdio`
//! - **TCP**: Raw TCP socket with JSON-RPC messages - feature: `tcp`
//! - **HTTP**: Server-sent event stream paired with a POST callback - feature: `http`
//!
//! Each transport handles the connection lifecycle, attaches one session per
//! client connection to the discovery notifier, and delegates message
//! processing to the MCP server handler.
//!
//! # Feature Flags
//!
//! Transport implementations are conditionally compiled based on features:
//! - `stdio` (default): STDIO transport - minimal dependencies
//! - `tcp`: TCP transport - adds tokio/net
//! - `http` (default): SSE transport - adds axum, tower, tower-http

mod config;
mod error;
mod service;
mod session;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;
pub use session::{SessionId, SessionRegistry, SessionSink};

// Re-export configs for convenience
#[cfg(feature = "tcp")]
pub use config::TcpConfig;

#[cfg(feature = "http")]
pub use config::HttpConfig;

#[cfg(any(feature = "stdio", feature = "tcp"))]
use rmcp::{RoleServer, service::RunningService};

#[cfg(any(feature = "stdio", feature = "tcp"))]
use crate::core::McpServer;

/// Drive one initialized rmcp session until the client disconnects.
///
/// The session's peer is attached to the discovery notifier for its
/// lifetime, then detached.
#[cfg(any(feature = "stdio", feature = "tcp"))]
pub(crate) async fn run_rmcp_session(
    service: RunningService<RoleServer, McpServer>,
    label: &str,
) -> TransportResult<()> {
    let notifier = service.service().notifier().clone();
    let session_id = notifier
        .attach(std::sync::Arc::new(service.peer().clone()))
        .await;
    tracing::info!(session = %session_id, "Client {} connected, serving...", label);

    let outcome = service.waiting().await;
    notifier.detach(&session_id).await;

    match outcome {
        Ok(reason) => {
            tracing::info!(session = %session_id, "Client {} disconnected: {:?}", label, reason);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(session = %session_id, "Error while serving client {}: {}", label, e);
            Err(TransportError::ServiceError(e.to_string()))
        }
    }
}
