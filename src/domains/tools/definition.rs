//! Tool definitions - immutable, schema-checked tool metadata.

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool, ToolAnnotations};

use super::error::SchemaError;
use super::schema::check_well_formed;

// ============================================================================
// Behavioral Hints
// ============================================================================

/// Behavioral hints advertised with a tool.
///
/// These map one-to-one onto MCP tool annotations. The toolset policy reads
/// `destructive` to decide visibility in read-only mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolHints {
    /// Display title.
    pub title: Option<String>,
    pub read_only: bool,
    pub destructive: bool,
    pub idempotent: bool,
    pub open_world: bool,
}

impl ToolHints {
    /// Hints for a tool that only inspects state.
    pub fn read_only(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            read_only: true,
            destructive: false,
            idempotent: true,
            open_world: false,
        }
    }

    /// Hints for a tool that modifies state.
    pub fn mutating(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            read_only: false,
            destructive: true,
            idempotent: false,
            open_world: false,
        }
    }

    fn to_annotations(&self) -> ToolAnnotations {
        ToolAnnotations {
            title: self.title.clone(),
            read_only_hint: Some(self.read_only),
            destructive_hint: Some(self.destructive),
            idempotent_hint: Some(self.idempotent),
            open_world_hint: Some(self.open_world),
        }
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Description of one capability: name, description, input schema and hints.
///
/// Definitions are validated on construction and cannot be modified
/// afterwards.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Arc<JsonObject>,
    hints: ToolHints,
}

impl ToolDefinition {
    /// Create a new definition.
    ///
    /// Fails with [`SchemaError`] if the name is empty or the schema is not a
    /// well-formed object schema.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Arc<JsonObject>,
        hints: ToolHints,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }

        check_well_formed(&input_schema).map_err(|reason| SchemaError::malformed(&name, reason))?;

        Ok(Self {
            name,
            description: description.into(),
            input_schema,
            hints,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &JsonObject {
        &self.input_schema
    }

    pub fn hints(&self) -> &ToolHints {
        &self.hints
    }

    /// Create a Tool model for this definition (wire metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: self.input_schema.clone(),
            annotations: Some(self.hints.to_annotations()),
            output_schema: None,
            icons: None,
            meta: None,
            title: self.hints.title.clone(),
        }
    }
}
