//! Repository discovery tool definition.
//!
//! Walks a directory tree breadth-first and reports every git working tree
//! found. Hidden directories are skipped and found repositories are not
//! descended into.

use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::command::{GitError, probe_repository, resolve_repo_path, text_outcome};
use crate::core::config::Config;
use crate::domains::tools::{SchemaError, ToolCapability, ToolHints};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the repository discovery tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitFindRepositoriesParams {
    /// Directory to search from.
    pub path: String,

    /// How many directory levels below `path` to search (default 3).
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

fn default_max_depth() -> u32 {
    3
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Repository discovery tool - finds git repositories below a directory.
pub struct GitFindRepositoriesTool;

impl GitFindRepositoriesTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "find_git_repositories";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Find git repositories under a directory. Returns one repository path per line; pass these paths to the other git tools.";

    #[instrument(skip_all, fields(path = %params.path, max_depth = params.max_depth))]
    pub async fn execute(
        params: GitFindRepositoriesParams,
        config: &Config,
    ) -> Result<String, GitError> {
        let root = resolve_repo_path(&params.path, config)?;
        let repositories = Self::search(root, params.max_depth).await?;

        info!("Found {} repositories under {}", repositories.len(), params.path);
        if repositories.is_empty() {
            return Ok(format!("No git repositories found under {}", params.path));
        }

        Ok(repositories
            .iter()
            .map(|repo| repo.display().to_string())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Breadth-first search; each directory is probed exactly once.
    async fn search(root: PathBuf, max_depth: u32) -> Result<Vec<PathBuf>, GitError> {
        let mut found = Vec::new();
        let mut queue = VecDeque::from([(root, 0u32)]);

        while let Some((dir, depth)) = queue.pop_front() {
            if probe_repository(&dir).await? {
                debug!("Repository at {}", dir.display());
                found.push(dir);
                continue;
            }

            if depth >= max_depth {
                continue;
            }

            for child in Self::visible_subdirectories(&dir).await {
                queue.push_back((child, depth + 1));
            }
        }

        Ok(found)
    }

    /// Non-hidden child directories, sorted by name. Symlinks are not followed.
    async fn visible_subdirectories(dir: &Path) -> Vec<PathBuf> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read directory {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut children = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Error reading entry in {}: {}", dir.display(), e);
                    break;
                }
            };

            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => children.push(entry.path()),
                Ok(_) => {}
                Err(e) => warn!("Failed to get file type for {}: {}", entry.path().display(), e),
            }
        }

        children.sort();
        children
    }

    pub fn capability(config: Arc<Config>) -> Result<ToolCapability, SchemaError> {
        ToolCapability::typed(
            Self::NAME,
            Self::DESCRIPTION,
            ToolHints::read_only("Find Git Repositories"),
            move |params: GitFindRepositoriesParams| {
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
    use std::fs;
    use tempfile::TempDir;

    fn params(dir: &TempDir, max_depth: u32) -> GitFindRepositoriesParams {
        GitFindRepositoriesParams {
            path: dir.path().to_string_lossy().to_string(),
            max_depth,
        }
    }

    #[tokio::test]
    async fn test_finds_nested_repositories() {
        let temp_dir = TempDir::new().unwrap();
        let alpha = temp_dir.path().join("alpha");
        let beta = temp_dir.path().join("group").join("beta");
        fs::create_dir_all(&alpha).unwrap();
        fs::create_dir_all(&beta).unwrap();
        init_repo(&alpha, 0);
        init_repo(&beta, 0);

        let config = config_for(temp_dir.path());
        let output = GitFindRepositoriesTool::execute(params(&temp_dir, 3), &config)
            .await
            .unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                alpha.canonicalize().unwrap().display().to_string(),
                beta.canonicalize().unwrap().display().to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_respects_max_depth() {
        let temp_dir = TempDir::new().unwrap();
        let deep = temp_dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        init_repo(&deep, 0);

        let config = config_for(temp_dir.path());
        let shallow = GitFindRepositoriesTool::execute(params(&temp_dir, 2), &config)
            .await
            .unwrap();
        assert!(shallow.starts_with("No git repositories found"));

        let found = GitFindRepositoriesTool::execute(params(&temp_dir, 3), &config)
            .await
            .unwrap();
        assert_eq!(found, deep.canonicalize().unwrap().display().to_string());
    }

    #[tokio::test]
    async fn test_skips_hidden_and_does_not_descend() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".cache").join("repo");
        let outer = temp_dir.path().join("outer");
        let inner = outer.join("vendor").join("inner");
        fs::create_dir_all(&hidden).unwrap();
        fs::create_dir_all(&inner).unwrap();
        init_repo(&hidden, 0);
        init_repo(&outer, 0);
        init_repo(&inner, 0);

        let config = config_for(temp_dir.path());
        let output = GitFindRepositoriesTool::execute(params(&temp_dir, 5), &config)
            .await
            .unwrap();

        assert_eq!(output, outer.canonicalize().unwrap().display().to_string());
    }

    #[tokio::test]
    async fn test_finds_linked_worktree() {
        let temp_dir = TempDir::new().unwrap();
        let main = temp_dir.path().join("main");
        let linked = temp_dir.path().join("worktrees").join("feature");
        fs::create_dir_all(&main).unwrap();
        fs::create_dir_all(linked.parent().unwrap()).unwrap();
        init_repo(&main, 1);
        git(&main, &["worktree", "add", "-b", "feature", linked.to_str().unwrap()]);
        fs::create_dir(linked.join("nested")).unwrap();

        let config = config_for(temp_dir.path());
        let output = GitFindRepositoriesTool::execute(params(&temp_dir, 3), &config)
            .await
            .unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                main.canonicalize().unwrap().display().to_string(),
                linked.canonicalize().unwrap().display().to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_root_outside_allowed_directory() {
        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();

        let config = config_for(root.path());
        let result = GitFindRepositoriesTool::execute(params(&outside, 3), &config).await;

        assert!(matches!(result, Err(GitError::PathSecurity(_))));
    }
}
