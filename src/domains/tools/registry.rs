//! Capability Registry - central registration and lookup for all tools.
//!
//! This module provides:
//! - The base list of tools shipped with the server
//! - Policy-filtered listing in declaration order
//! - Name resolution that honours the same policy as listing

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::core::config::Config;

use super::capability::ToolCapability;
use super::definition::ToolDefinition;
use super::definitions::{
    GitCheckoutBranchTool, GitCommitTool, GitCurrentBranchTool, GitDiffTool, GitFindRepositoriesTool,
    GitLogTool, GitStatusTool,
};
use super::error::{SchemaError, ToolError};
use super::policy::{ToolsetConfig, is_visible};

// ============================================================================
// Base Capabilities
// ============================================================================

/// Get every tool shipped with the server, in advertised order.
///
/// This is the single source of truth for the base capability list; the
/// toolset policy only ever narrows it.
pub fn base_capabilities(config: Arc<Config>) -> Result<Vec<ToolCapability>, SchemaError> {
    Ok(vec![
        GitFindRepositoriesTool::capability(config.clone())?,
        GitStatusTool::capability(config.clone())?,
        GitCurrentBranchTool::capability(config.clone())?,
        GitLogTool::capability(config.clone())?,
        GitDiffTool::capability(config.clone())?,
        GitCheckoutBranchTool::capability(config.clone())?,
        GitCommitTool::capability(config)?,
    ])
}

// ============================================================================
// Capability Registry
// ============================================================================

/// The set of capabilities and the toolset that filters them.
///
/// A registry never changes after construction. Reconfiguration builds a
/// new registry over the same base list with [`CapabilityRegistry::with_toolset`].
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    capabilities: Arc<[ToolCapability]>,
    index: Arc<HashMap<String, usize>>,
    toolset: ToolsetConfig,
}

impl CapabilityRegistry {
    /// Create a registry over `capabilities`.
    ///
    /// Fails with [`SchemaError::DuplicateName`] if two capabilities share a name.
    pub fn new(capabilities: Vec<ToolCapability>, toolset: ToolsetConfig) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(capabilities.len());
        for (position, capability) in capabilities.iter().enumerate() {
            if index.insert(capability.name().to_string(), position).is_some() {
                return Err(SchemaError::DuplicateName(capability.name().to_string()));
            }
        }

        let registry = Self {
            capabilities: capabilities.into(),
            index: Arc::new(index),
            toolset,
        };
        registry.log_unknown_allowed();
        Ok(registry)
    }

    /// The same base capabilities under a different toolset.
    pub fn with_toolset(&self, toolset: ToolsetConfig) -> Self {
        let registry = Self {
            capabilities: self.capabilities.clone(),
            index: self.index.clone(),
            toolset,
        };
        registry.log_unknown_allowed();
        registry
    }

    pub fn toolset(&self) -> &ToolsetConfig {
        &self.toolset
    }

    /// Visible definitions, in declaration order.
    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.capabilities
            .iter()
            .map(ToolCapability::definition)
            .filter(|definition| is_visible(definition, &self.toolset))
            .collect()
    }

    /// Names of the visible tools, in declaration order.
    pub fn visible_names(&self) -> Vec<&str> {
        self.list().into_iter().map(ToolDefinition::name).collect()
    }

    /// Resolve a visible capability by name.
    ///
    /// Hidden capabilities resolve to [`ToolError::NotFound`] exactly like
    /// unknown ones.
    pub fn resolve(&self, name: &str) -> Result<&ToolCapability, ToolError> {
        self.index
            .get(name)
            .map(|&position| &self.capabilities[position])
            .filter(|capability| is_visible(capability.definition(), &self.toolset))
            .ok_or_else(|| ToolError::not_found(name))
    }

    /// Number of base capabilities, visible or not.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    fn log_unknown_allowed(&self) {
        for name in &self.toolset.available_tools {
            if !self.index.contains_key(name) {
                debug!("Ignoring unknown tool in allow-list: {}", name);
            }
        }
    }
}
