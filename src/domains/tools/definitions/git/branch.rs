//! Current branch tool definition.

use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::command::{GitError, resolve_repo_path, run_git, text_outcome};
use crate::core::config::Config;
use crate::domains::tools::{SchemaError, ToolCapability, ToolHints};

/// Reported when HEAD does not point at a branch.
const DETACHED_HEAD: &str = "HEAD (detached)";

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the current branch tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitCurrentBranchParams {
    /// Path to the repository.
    pub path: String,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Current branch tool - name of the checked out branch.
pub struct GitCurrentBranchTool;

impl GitCurrentBranchTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_current_branch";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Get the name of the currently checked out branch of a git repository.";

    #[instrument(skip_all, fields(path = %params.path))]
    pub async fn execute(params: GitCurrentBranchParams, config: &Config) -> Result<String, GitError> {
        let repo = resolve_repo_path(&params.path, config)?;
        let output = run_git(&repo, &["branch", "--show-current"]).await?;

        let branch = output.trim();
        let branch = if branch.is_empty() { DETACHED_HEAD } else { branch };
        info!("Current branch of {}: {}", repo.display(), branch);
        Ok(branch.to_string())
    }

    pub fn capability(config: Arc<Config>) -> Result<ToolCapability, SchemaError> {
        ToolCapability::typed(
            Self::NAME,
            Self::DESCRIPTION,
            ToolHints::read_only("Current Branch"),
            move |params: GitCurrentBranchParams| {
                let config = config.clone();
                async move { text_outcome(Self::execute(params, &config).await) }
            },
        )
    }
}
