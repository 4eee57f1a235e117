//! Running the `git` binary.
//!
//! Every git tool goes through [`run_git`], so spawn failures, non-zero exits
//! and path checks surface as one error type.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use rmcp::model::Content;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::core::config::Config;
use crate::core::security::{PathSecurityError, validate_path};
use crate::domains::tools::ToolOutcome;

/// Errors raised while running git for a tool.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git binary could not be started at all.
    #[error("Failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    /// Git ran and exited non-zero.
    #[error("git {command} failed ({status}): {output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("Path security validation failed: {0}")]
    PathSecurity(#[from] PathSecurityError),

    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Validate a tool's `path` argument and make sure it names a directory.
pub fn resolve_repo_path(path: &str, config: &Config) -> Result<PathBuf, GitError> {
    let resolved = validate_path(path, config)?;
    if !resolved.is_dir() {
        return Err(GitError::NotADirectory(resolved));
    }
    Ok(resolved)
}

/// Run `git -C <repo> <args...>` and return its stdout.
pub async fn run_git(repo: &Path, args: &[&str]) -> Result<String, GitError> {
    debug!(repo = %repo.display(), "git {}", args.join(" "));

    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(GitError::Spawn)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        // Some failures ("nothing to commit") are only reported on stdout.
        let output_text = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        return Err(GitError::CommandFailed {
            command: args.first().copied().unwrap_or_default().to_string(),
            status: output.status.to_string(),
            output: output_text,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Whether `dir` is the top level of a git working tree.
///
/// Linked worktrees and submodule checkouts count too: `--show-cdup` is empty
/// exactly at a working tree root. A probe that exits non-zero means "not a
/// repository". Only a failure to start git at all is an error.
pub async fn probe_repository(dir: &Path) -> Result<bool, GitError> {
    match run_git(dir, &["rev-parse", "--show-cdup"]).await {
        Ok(cdup) => Ok(cdup.trim().is_empty()),
        Err(GitError::CommandFailed { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Wrap a tool's text output as a single content block.
pub fn text_outcome(result: Result<String, GitError>) -> ToolOutcome {
    Ok(vec![Content::text(result?)])
}

/// Reject values git would parse as an option.
pub fn ensure_not_option(name: &str, value: &str) -> Result<(), GitError> {
    if value.starts_with('-') {
        return Err(GitError::InvalidArgument(format!(
            "{name} must not start with '-': {value}"
        )));
    }
    Ok(())
}
