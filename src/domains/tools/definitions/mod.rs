//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod git;

pub use git::{
    GitCheckoutBranchTool, GitCommitTool, GitCurrentBranchTool, GitDiffTool, GitError,
    GitFindRepositoriesTool, GitLogTool, GitStatusTool,
};
