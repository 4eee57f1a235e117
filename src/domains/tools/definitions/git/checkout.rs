//! Branch checkout tool definition.

use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::command::{GitError, ensure_not_option, resolve_repo_path, run_git, text_outcome};
use crate::core::config::Config;
use crate::domains::tools::{SchemaError, ToolCapability, ToolHints};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the checkout tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitCheckoutBranchParams {
    /// Path to the repository.
    pub path: String,

    /// Branch to switch to.
    pub branch: String,

    /// Create the branch before switching to it.
    #[serde(default)]
    pub create: bool,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Checkout tool - switches the working tree to another branch.
pub struct GitCheckoutBranchTool;

impl GitCheckoutBranchTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "git_checkout_branch";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Switch a git repository to another branch, optionally creating it first. Modifies the working tree.";

    #[instrument(skip_all, fields(path = %params.path, branch = %params.branch))]
    pub async fn execute(params: GitCheckoutBranchParams, config: &Config) -> Result<String, GitError> {
        let repo = resolve_repo_path(&params.path, config)?;
        ensure_not_option("branch", &params.branch)?;

        let mut args = vec!["checkout"];
        if params.create {
            args.push("-b");
        }
        args.push(&params.branch);

        run_git(&repo, &args).await?;

        let message = if params.create {
            format!("Switched to a new branch '{}'", params.branch)
        } else {
            format!("Switched to branch '{}'", params.branch)
        };
        info!("{} in {}", message, repo.display());
        Ok(message)
    }

    pub fn capability(config: Arc<Config>) -> Result<ToolCapability, SchemaError> {
        ToolCapability::typed(
            Self::NAME,
            Self::DESCRIPTION,
            ToolHints::mutating("Checkout Branch"),
            move |params: GitCheckoutBranchParams| {
                let config = config.clone();
                async move { text_outcome(Self::execute(params, &config).await) }
            },
        )
    }
}
