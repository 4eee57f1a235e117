//! Tool-specific error types.
//!
//! Errors fall into four kinds with stable discriminants so that clients can
//! branch on them: `SchemaError` (registration time only), `NotFound`,
//! `ValidationError` and `ToolExecutionError`.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use thiserror::Error;

/// Stable discriminant for every error the tools domain can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    SchemaError,
    NotFound,
    ValidationError,
    ToolExecutionError,
}

impl ErrorKind {
    /// The discriminant string sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaError => "SchemaError",
            Self::NotFound => "NotFound",
            Self::ValidationError => "ValidationError",
            Self::ToolExecutionError => "ToolExecutionError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool definition or capability set that cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Tool names must be non-empty.
    #[error("Tool name must not be empty")]
    EmptyName,

    /// Two capabilities were registered under the same name.
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),

    /// The input schema is not a well-formed object schema.
    #[error("Malformed input schema for tool '{tool}': {reason}")]
    Malformed { tool: String, reason: String },
}

impl SchemaError {
    /// Create a new "malformed schema" error.
    pub fn malformed(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Arguments that do not satisfy a tool's input schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid argument '{path}': {message}")]
pub struct ValidationError {
    /// Path of the offending field, e.g. `maxCount` or `options.depth`.
    /// `$` designates the argument object itself.
    pub path: String,

    /// What is wrong with the value.
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the dispatch engine for a single invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool does not exist or is hidden by the toolset policy.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The arguments failed schema validation; the handler was not called.
    #[error("Invalid arguments for tool '{tool}': {source}")]
    Validation {
        tool: String,
        #[source]
        source: ValidationError,
    },

    /// The handler ran and failed.
    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new validation error.
    pub fn validation(tool: impl Into<String>, source: ValidationError) -> Self {
        Self::Validation {
            tool: tool.into(),
            source,
        }
    }

    /// Create a new "execution failed" error.
    pub fn execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::Execution { .. } => ErrorKind::ToolExecutionError,
        }
    }

    /// Structured payload attached to the error on the wire.
    pub fn data(&self) -> serde_json::Value {
        match self {
            Self::NotFound(name) => serde_json::json!({
                "kind": self.kind(),
                "tool": name,
            }),
            Self::Validation { tool, source } => serde_json::json!({
                "kind": self.kind(),
                "tool": tool,
                "path": source.path,
            }),
            Self::Execution { tool, message } => serde_json::json!({
                "kind": self.kind(),
                "tool": tool,
                "message": message,
            }),
        }
    }

    /// Normalize into the MCP response shape.
    ///
    /// Lookup and validation failures are protocol errors (`-32602`); handler
    /// failures are tool results with `isError` set, as MCP prescribes.
    pub fn into_call_result(self) -> Result<CallToolResult, McpError> {
        let data = self.data();
        match self {
            Self::NotFound(_) | Self::Validation { .. } => {
                Err(McpError::invalid_params(self.to_string(), Some(data)))
            }
            Self::Execution { .. } => Ok(CallToolResult {
                content: vec![Content::text(self.to_string())],
                structured_content: Some(data),
                is_error: Some(true),
                meta: None,
            }),
        }
    }
}
