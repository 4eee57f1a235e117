//! Toolset policy - which capabilities are exposed to clients.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::definition::ToolDefinition;

/// Coarse visibility mode for the toolset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolsetMode {
    /// Only tools whose `destructiveHint` is false.
    ReadOnly,
    /// Every tool.
    #[default]
    All,
}

impl FromStr for ToolsetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "readonly" | "read-only" | "read_only" => Ok(Self::ReadOnly),
            "all" => Ok(Self::All),
            other => Err(format!("unknown toolset mode '{other}' (expected readOnly or all)")),
        }
    }
}

/// Toolset configuration: a mode plus an optional allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsetConfig {
    pub mode: ToolsetMode,

    /// If non-empty, only these tool names are exposed.
    #[serde(default)]
    pub available_tools: Vec<String>,
}

impl ToolsetConfig {
    pub fn new(mode: ToolsetMode) -> Self {
        Self {
            mode,
            available_tools: Vec::new(),
        }
    }

    /// Restrict the toolset to the given names.
    pub fn with_available_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_tools = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Whether a tool is visible under the given toolset configuration.
///
/// The mode check and the allow-list check must both pass.
pub fn is_visible(definition: &ToolDefinition, toolset: &ToolsetConfig) -> bool {
    let mode_allows = match toolset.mode {
        ToolsetMode::ReadOnly => !definition.hints().destructive,
        ToolsetMode::All => true,
    };

    let listed = toolset.available_tools.is_empty()
        || toolset
            .available_tools
            .iter()
            .any(|name| name == definition.name());

    mode_allows && listed
}
