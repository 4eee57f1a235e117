//! Git log tool definition.

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

/// Parameters for the git log tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitLogParams {
    /// Path to the repository.
    pub path: String,

    /// Maximum number of commits to return (default 10).
    #[serde(default = "default_max_count")]
    #[schemars(range(min = 1))]
    pub max_count: u32,
}

fn default_max_count() -> u32 {
    10
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Git log tool - one summary line per recent commit.
pub struct GitLogTool;

impl GitLogTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get_git_log";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Show recent commits of a git repository, one line per commit: short hash, date, author and subject.";

    #[instrument(skip_all, fields(path = %params.path, max_count = params.max_count))]
    pub async fn execute(params: GitLogParams, config: &Config) -> Result<String, GitError> {
        let repo = resolve_repo_path(&params.path, config)?;
        let max_count = format!("--max-count={}", params.max_count.max(1));

        let output = run_git(
            &repo,
            &[
                "log",
                &max_count,
                "--date=short",
                "--pretty=format:%h %ad %an: %s",
            ],
        )
        .await?;

        let lines: Vec<&str> = output.lines().filter(|line| !line.is_empty()).collect();
        info!("Read {} commit(s) from {}", lines.len(), repo.display());
        Ok(lines.join("\n"))
    }

    pub fn capability(config: Arc<Config>) -> Result<ToolCapability, SchemaError> {
        ToolCapability::typed(
            Self::NAME,
            Self::DESCRIPTION,
            ToolHints::read_only("Git Log"),
            move |params: GitLogParams| {
                let config = config.clone();
                async move { text_outcome(Self::execute(params, &config).await) }
            },
        )
    }
}
