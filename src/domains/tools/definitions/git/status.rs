//! Git status tool definition.

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

/// Parameters for the git status tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitStatusParams {
    /// Path to the repository.
    pub path: String,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Git status tool - short working tree status with branch information.
pub struct GitStatusTool;

impl GitStatusTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_git_status";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Show the working tree status of a git repository in short format, including the current branch and its upstream.";

    #[instrument(skip_all, fields(path = %params.path))]
    pub async fn execute(params: GitStatusParams, config: &Config) -> Result<String, GitError> {
        let repo = resolve_repo_path(&params.path, config)?;
        let output = run_git(&repo, &["status", "--short", "--branch"]).await?;
        info!("Status read for {}", repo.display());
        Ok(output.trim_end().to_string())
    }

    pub fn capability(config: Arc<Config>) -> Result<ToolCapability, SchemaError> {
        ToolCapability::typed(
            Self::NAME,
            Self::DESCRIPTION,
            ToolHints::read_only("Git Status"),
            move |params: GitStatusParams| {
                let config = config.clone();
                async move { text_outcome(Self::execute(params, &config).await) }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::git::test_support::{config_for, init_repo};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_status_shows_branch_and_untracked() {
        let temp_dir = TempDir::new().unwrap();
        init_repo(temp_dir.path(), 1);
        std::fs::write(temp_dir.path().join("new.txt"), "new").unwrap();

        let config = config_for(temp_dir.path());
        let params = GitStatusParams {
            path: temp_dir.path().to_string_lossy().to_string(),
        };
        let status = GitStatusTool::execute(params, &config).await.unwrap();

        assert!(status.starts_with("## main"));
        assert!(status.contains("?? new.txt"));
    }

    #[tokio::test]
    async fn test_status_outside_repository_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(temp_dir.path());
        let params = GitStatusParams {
            path: temp_dir.path().to_string_lossy().to_string(),
        };

        let result = GitStatusTool::execute(params, &config).await;
        assert!(matches!(result, Err(GitError::CommandFailed { .. })));
    }
}
