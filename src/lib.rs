//! Git MCP Server Library
//!
//! This crate provides a Model Context Protocol (MCP) server that exposes
//! git repository tools, with a policy-filtered tool registry and optional
//! dynamic tool discovery.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling,
//!   path security, transports and the main server
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: tool definitions, toolset policy, registry, dispatch and
//!     list-changed notifications
//!
//! # Example
//!
//! ```rust,no_run
//! use git_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
