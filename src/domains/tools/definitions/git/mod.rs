//! Git tools.
//!
//! Thin async wrappers around the `git` binary. Each tool validates its
//! repository path, runs one git command and returns the text output.

mod branch;
mod checkout;
mod command;
mod commit;
mod diff;
mod find_repositories;
mod log;
mod status;

pub use branch::{GitCurrentBranchParams, GitCurrentBranchTool};
pub use checkout::{GitCheckoutBranchParams, GitCheckoutBranchTool};
pub use command::GitError;
pub use commit::{GitCommitParams, GitCommitTool};
pub use diff::{GitDiffParams, GitDiffTool};
pub use find_repositories::{GitFindRepositoriesParams, GitFindRepositoriesTool};
pub use log::{GitLogParams, GitLogTool};
pub use status::{GitStatusParams, GitStatusTool};

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;

    use crate::core::config::Config;

    /// Run git synchronously in a test fixture, panicking on failure.
    pub fn git(dir: &Path, args: &[&str]) -> String {
        let output = std::process::Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .expect("git binary is available");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Initialize a repository on branch `main` with `commits` commits.
    pub fn init_repo(dir: &Path, commits: usize) {
        git(dir, &["init", "-q"]);
        git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        git(dir, &["config", "user.name", "Test User"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "commit.gpgsign", "false"]);

        for i in 0..commits {
            std::fs::write(dir.join("file.txt"), format!("revision {i}\n")).unwrap();
            git(dir, &["add", "file.txt"]);
            git(dir, &["commit", "-q", "-m", &format!("commit {i}")]);
        }
    }

    /// Config confined to `root`.
    pub fn config_for(root: &Path) -> Arc<Config> {
        let mut config = Config::default();
        config.security.root_path = Some(root.to_path_buf());
        Arc::new(config)
    }
}
