//! Commit tool definition.

use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::command::{GitError, resolve_repo_path, run_git, text_outcome};
use crate::core::config::Config;
use crate::domains::tools::{SchemaError, ToolCapability, ToolHints};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the commit tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitParams {
    /// Path to the repository.
    pub path: String,

    /// Commit message.
    pub message: String,

    /// Stage all modified tracked files before committing.
    #[serde(default)]
    pub all: bool,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Commit tool - records staged changes.
pub struct GitCommitTool;

impl GitCommitTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "git_commit";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Record staged changes in a git repository with the given message. Set all to include every modified tracked file.";

    #[instrument(skip_all, fields(path = %params.path, all = params.all))]
    pub async fn execute(params: GitCommitParams, config: &Config) -> Result<String, GitError> {
        let repo = resolve_repo_path(&params.path, config)?;
        if params.message.trim().is_empty() {
            return Err(GitError::InvalidArgument(
                "commit message must not be empty".to_string(),
            ));
        }

        let mut args = vec!["commit"];
        if params.all {
            args.push("-a");
        }
        args.extend(["-m", params.message.as_str()]);

        let output = run_git(&repo, &args).await?;
        info!("Committed in {}", repo.display());
        Ok(output.trim_end().to_string())
    }

    pub fn capability(config: Arc<Config>) -> Result<ToolCapability, SchemaError> {
        ToolCapability::typed(
            Self::NAME,
            Self::DESCRIPTION,
            ToolHints::mutating("Commit"),
            move |params: GitCommitParams| {
                let config = config.clone();
                async move { text_outcome(Self::execute(params, &config).await) }
            },
        )
    }
}
