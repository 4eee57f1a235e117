//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, configuration files, or defaults.

use super::transport::TransportConfig;
use crate::domains::tools::{DiscoveryConfig, ToolsetConfig, ToolsetMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Which tools are exposed to clients.
    #[serde(default)]
    pub toolset: ToolsetConfig,

    /// Dynamic tool discovery (list-changed notifications).
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Security and path validation configuration.
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,

    /// Free-form guidance returned alongside the tool list.
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for security and path validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Optional root directory for repository paths.
    /// If None, no path restrictions are enforced.
    /// Relative tool paths are resolved against this root.
    pub root_path: Option<PathBuf>,

    /// Whether symlinked paths may be used at all.
    /// Followed symlinks must still resolve inside the root.
    pub allow_symlinks: bool,
}

/// Call order shown to clients unless `MCP_INSTRUCTIONS` overrides it.
pub const DEFAULT_INSTRUCTIONS: &str = "Call find_git_repositories first to locate repositories, \
then pass one of the returned paths to the other tools. Inspect changes with get_git_status \
and get_git_diff before calling git_commit.";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "git-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_timestamps: true,
        }
    }
}

impl LoggingConfig {
    /// Read `MCP_LOG_LEVEL` and `MCP_LOG_TIMESTAMPS`.
    ///
    /// Needs nothing else from the environment, so logging can be set up
    /// before the rest of the configuration is loaded and validated.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut logging = Self::default();
        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            logging.level = level;
        }
        if let Ok(timestamps) = std::env::var("MCP_LOG_TIMESTAMPS") {
            logging.with_timestamps = parse_flag(&timestamps).unwrap_or(true);
        }
        logging
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            // No root path restriction by default
            root_path: None,
            allow_symlinks: true,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_TOOLSET`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(instructions) = std::env::var("MCP_INSTRUCTIONS") {
            if !instructions.trim().is_empty() {
                config.server.instructions = Some(instructions);
            }
        }

        config.logging = LoggingConfig::from_env();

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        // Load toolset configuration
        if let Ok(mode) = std::env::var("MCP_TOOLSET") {
            match mode.parse::<ToolsetMode>() {
                Ok(mode) => config.toolset.mode = mode,
                Err(e) => warn!("Ignoring MCP_TOOLSET: {}", e),
            }
        }

        if let Ok(tools) = std::env::var("MCP_AVAILABLE_TOOLS") {
            config.toolset.available_tools = tools
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }
        info!(
            "Toolset: {:?}, allow-list: {:?}",
            config.toolset.mode, config.toolset.available_tools
        );

        if let Ok(enabled) = std::env::var("MCP_DYNAMIC_TOOL_DISCOVERY") {
            config.discovery.enabled = parse_flag(&enabled).unwrap_or_else(|| {
                warn!("Invalid MCP_DYNAMIC_TOOL_DISCOVERY value '{}', disabling", enabled);
                false
            });
        }

        // Load security configuration
        if let Ok(root_path) = std::env::var("MCP_ROOT_PATH") {
            config.security.root_path = Some(PathBuf::from(root_path));
            info!("Path security enabled: root directory set to {:?}", config.security.root_path);
        } else {
            warn!(
                "MCP_ROOT_PATH not set - no path restrictions active. \
                 All repository paths will be allowed."
            );
        }

        if let Ok(allow_symlinks) = std::env::var("MCP_ALLOW_SYMLINKS") {
            config.security.allow_symlinks = parse_flag(&allow_symlinks).unwrap_or(true);
            info!("Symlinks allowed: {}", config.security.allow_symlinks);
        }

        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
