//! Git diff tool definition.

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

/// Parameters for the git diff tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitDiffParams {
    /// Path to the repository.
    pub path: String,

    /// Show staged changes instead of unstaged ones.
    #[serde(default)]
    pub staged: bool,

    /// Restrict the diff to one file, relative to the repository.
    #[serde(default)]
    pub file: Option<String>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Git diff tool - unstaged or staged changes.
pub struct GitDiffTool;

impl GitDiffTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_git_diff";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Show changes in a git repository as a unified diff. Set staged to see what will be committed, or file to limit the diff to one path.";

    #[instrument(skip_all, fields(path = %params.path, staged = params.staged))]
    pub async fn execute(params: GitDiffParams, config: &Config) -> Result<String, GitError> {
        let repo = resolve_repo_path(&params.path, config)?;

        let mut args = vec!["diff"];
        if params.staged {
            args.push("--cached");
        }
        if let Some(file) = params.file.as_deref() {
            args.extend(["--", file]);
        }

        let output = run_git(&repo, &args).await?;
        if output.trim().is_empty() {
            info!("No changes in {}", repo.display());
            return Ok("No changes".to_string());
        }

        info!("Diff of {} bytes for {}", output.len(), repo.display());
        Ok(output)
    }

    pub fn capability(config: Arc<Config>) -> Result<ToolCapability, SchemaError> {
        ToolCapability::typed(
            Self::NAME,
            Self::DESCRIPTION,
            ToolHints::read_only("Git Diff"),
            move |params: GitDiffParams| {
                let config = config.clone();
                async move { text_outcome(Self::execute(params, &config).await) }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::git::test_support::{config_for, git, init_repo};
    use tempfile::TempDir;

    fn params(dir: &TempDir, staged: bool, file: Option<&str>) -> GitDiffParams {
        GitDiffParams {
            path: dir.path().to_string_lossy().to_string(),
            staged,
            file: file.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_clean_tree_has_no_changes() {
        let temp_dir = TempDir::new().unwrap();
        init_repo(temp_dir.path(), 1);

        let config = config_for(temp_dir.path());
        let diff = GitDiffTool::execute(params(&temp_dir, false, None), &config)
            .await
            .unwrap();
        assert_eq!(diff, "No changes");
    }

    #[tokio::test]
    async fn test_unstaged_and_staged() {
        let temp_dir = TempDir::new().unwrap();
        init_repo(temp_dir.path(), 1);
        std::fs::write(temp_dir.path().join("file.txt"), "changed\n").unwrap();

        let config = config_for(temp_dir.path());
        let unstaged = GitDiffTool::execute(params(&temp_dir, false, None), &config)
            .await
            .unwrap();
        assert!(unstaged.contains("+changed"));

        let staged = GitDiffTool::execute(params(&temp_dir, true, None), &config)
            .await
            .unwrap();
        assert_eq!(staged, "No changes");

        git(temp_dir.path(), &["add", "file.txt"]);
        let staged = GitDiffTool::execute(params(&temp_dir, true, None), &config)
            .await
            .unwrap();
        assert!(staged.contains("-revision 0"));
    }

    #[tokio::test]
    async fn test_single_file() {
        let temp_dir = TempDir::new().unwrap();
        init_repo(temp_dir.path(), 1);
        std::fs::write(temp_dir.path().join("file.txt"), "changed\n").unwrap();

        let config = config_for(temp_dir.path());
        let other = GitDiffTool::execute(params(&temp_dir, false, Some("other.txt")), &config)
            .await
            .unwrap();
        assert_eq!(other, "No changes");

        let file = GitDiffTool::execute(params(&temp_dir, false, Some("file.txt")), &config)
            .await
            .unwrap();
        assert!(file.contains("file.txt"));
    }
}
