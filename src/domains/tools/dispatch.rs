//! Dispatch Engine - lists tools and routes invocations to their handlers.
//!
//! An invocation goes through three gates, each with its own error kind:
//! name resolution (`NotFound`), schema validation (`ValidationError`) and
//! the handler itself (`ToolExecutionError`). Handler failures, including
//! panics, are caught here and never reach the transport.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use futures::FutureExt;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use tracing::{debug, instrument, warn};

use super::error::ToolError;
use super::policy::ToolsetConfig;
use super::registry::CapabilityRegistry;
use super::schema::validate_arguments;

/// Result of a list request.
#[derive(Debug, Clone)]
pub struct ToolListing {
    /// Visible tools, in declaration order.
    pub tools: Vec<Tool>,

    /// Server instructions, attached to every listing.
    pub instructions: Option<String>,
}

/// Routes list and invoke requests against the current registry.
#[derive(Debug)]
pub struct DispatchEngine {
    /// Current registry snapshot. Requests clone the `Arc` and release the
    /// lock before doing any work.
    registry: RwLock<Arc<CapabilityRegistry>>,
    instructions: Option<String>,
}

impl DispatchEngine {
    pub fn new(registry: CapabilityRegistry, instructions: Option<String>) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            instructions,
        }
    }

    /// The registry requests are currently dispatched against.
    pub fn registry(&self) -> Arc<CapabilityRegistry> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// List the visible tools.
    pub fn list(&self) -> ToolListing {
        let registry = self.registry();
        ToolListing {
            tools: registry.list().into_iter().map(|d| d.to_tool()).collect(),
            instructions: self.instructions.clone(),
        }
    }

    /// Invoke a tool by name.
    ///
    /// Absent arguments are treated as an empty object. On success the
    /// handler's content is returned unchanged.
    #[instrument(skip(self, arguments), fields(tool = %name))]
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ToolError> {
        let registry = self.registry();
        let capability = registry.resolve(name)?;
        let arguments = arguments.unwrap_or_default();

        validate_arguments(capability.definition().input_schema(), &arguments)
            .map_err(|e| ToolError::validation(name, e))?;

        let call = capability
            .bind(arguments)
            .map_err(|e| ToolError::validation(name, e))?;

        debug!("Dispatching tool call");

        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(content)) => Ok(CallToolResult::success(content)),
            Ok(Err(e)) => {
                warn!("Tool execution failed: {:#}", e);
                Err(ToolError::execution(name, format!("{e:#}")))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!("Tool handler panicked: {}", message);
                Err(ToolError::execution(name, format!("handler panicked: {message}")))
            }
        }
    }

    /// Swap in the same base capabilities under a new toolset.
    ///
    /// Returns whether the visible tool list changed. Calls already in flight
    /// finish against the registry they started with.
    pub fn reconfigure(&self, toolset: ToolsetConfig) -> bool {
        let mut current = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let next = current.with_toolset(toolset);
        let changed = next.visible_names() != current.visible_names();
        *current = Arc::new(next);
        changed
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
