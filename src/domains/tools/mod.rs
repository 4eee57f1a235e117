//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients to perform
//! specific actions or computations.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `definition.rs` / `capability.rs` - Tool metadata and bound handlers
//! - `policy.rs` - Toolset visibility rules
//! - `registry.rs` - Base tool list and policy-filtered lookup
//! - `dispatch.rs` - Listing and invocation
//! - `discovery.rs` - List-changed notifications to connected sessions
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` with a parameter struct and an
//!    `execute()` function
//! 2. Add a `capability()` constructor using [`ToolCapability::typed`]
//! 3. Add it to [`base_capabilities`] in `registry.rs`

mod capability;
mod definition;
pub mod definitions;
mod discovery;
mod dispatch;
mod error;
mod policy;
mod registry;
mod schema;

pub use capability::{ToolCapability, ToolFuture, ToolOutcome};
pub use definition::{ToolDefinition, ToolHints};
pub use discovery::{DiscoveryConfig, DiscoveryNotifier};
pub use dispatch::{DispatchEngine, ToolListing};
pub use error::{ErrorKind, SchemaError, ToolError, ValidationError};
pub use policy::{ToolsetConfig, ToolsetMode, is_visible};
pub use registry::{CapabilityRegistry, base_capabilities};
pub use schema::validate_arguments;
