use std::io;
use std::path::{Path, PathBuf};

use crate::core::config::Config;

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is outside allowed root directory '{root}'")]
    OutsideRootDirectory { path: PathBuf, root: PathBuf },

    #[error("Symlink '{path}' points outside allowed root directory")]
    SymlinkOutsideRoot { path: PathBuf },

    #[error("Symlinks are not allowed: '{path}'")]
    SymlinkNotAllowed { path: PathBuf },

    #[error("Cannot canonicalize path '{path}': {error}")]
    CannotCanonicalize { path: PathBuf, error: io::Error },

    #[error("Path does not exist: '{path}'")]
    PathNotFound { path: PathBuf },

    #[error("IO error for path '{path}': {error}")]
    IoError { path: PathBuf, error: io::Error },
}

/// Validates that a repository path is within the configured security boundaries.
///
/// This function performs the following checks:
/// 1. Resolves relative paths against the configured root, if any
/// 2. Rejects symlinks when the configuration forbids them
/// 3. Canonicalizes the path and ensures it stays within the root
///
/// # Returns
///
/// * `Ok(PathBuf)` - The canonicalized, validated path
/// * `Err(PathSecurityError)` - If validation fails
///
/// # Examples
///
/// ```rust,ignore
/// let config = Config::from_env();
/// let repo = validate_path("projects/website", &config)?;
/// ```
pub fn validate_path(input_path: &str, config: &Config) -> Result<PathBuf, PathSecurityError> {
    let requested = Path::new(input_path);

    // If no root path is configured, only do basic canonicalization
    let Some(ref root) = config.security.root_path else {
        reject_symlink(requested, config)?;
        return canonicalize_path(requested);
    };

    let canonical_root = root.canonicalize().map_err(|e| PathSecurityError::IoError {
        path: root.clone(),
        error: e,
    })?;

    let path = if requested.is_relative() {
        canonical_root.join(requested)
    } else {
        requested.to_path_buf()
    };

    if !path.exists() {
        return Err(PathSecurityError::PathNotFound { path });
    }

    reject_symlink(&path, config)?;

    let canonical_path = canonicalize_path(&path)?;

    if !is_within_root(&canonical_path, &canonical_root) {
        // A link that lives inside the root but leads out of it gets its own error.
        if path.is_symlink() {
            return Err(PathSecurityError::SymlinkOutsideRoot { path });
        }
        return Err(PathSecurityError::OutsideRootDirectory {
            path: canonical_path,
            root: canonical_root,
        });
    }

    Ok(canonical_path)
}

fn reject_symlink(path: &Path, config: &Config) -> Result<(), PathSecurityError> {
    if path.is_symlink() && !config.security.allow_symlinks {
        return Err(PathSecurityError::SymlinkNotAllowed {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Checks if a path is within (or equal to) a root directory
fn is_within_root(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

fn canonicalize_path(path: &Path) -> Result<PathBuf, PathSecurityError> {
    path.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathSecurityError::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PathSecurityError::CannotCanonicalize {
                path: path.to_path_buf(),
                error: e,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_config(root: Option<PathBuf>, allow_symlinks: bool) -> Config {
        use crate::core::config::SecurityConfig;

        let mut config = Config::default();
        config.security = SecurityConfig {
            root_path: root,
            allow_symlinks,
        };
        config
    }

    #[test]
    fn test_no_root_allows_existing_paths() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(None, true);
        let result = validate_path(temp_dir.path().to_str().unwrap(), &config);

        assert_eq!(result.unwrap(), temp_dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_relative_path_resolves_against_root() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("repo")).unwrap();

        let config = create_test_config(Some(temp_dir.path().to_path_buf()), true);
        let result = validate_path("repo", &config).unwrap();

        assert_eq!(result, temp_dir.path().join("repo").canonicalize().unwrap());
    }

    #[test]
    fn test_path_outside_root() {
        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();

        let config = create_test_config(Some(root_dir.path().to_path_buf()), true);
        let result = validate_path(outside_dir.path().to_str().unwrap(), &config);

        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideRootDirectory { .. })
        ));
    }

    #[test]
    fn test_path_traversal_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::create_dir(temp_dir.path().join("sibling")).unwrap();

        let config = create_test_config(Some(subdir), true);
        let result = validate_path("../sibling", &config);

        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideRootDirectory { .. })
        ));
    }

    #[test]
    fn test_nonexistent_path() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(Some(temp_dir.path().to_path_buf()), true);
        let result = validate_path("does_not_exist", &config);

        assert!(matches!(result, Err(PathSecurityError::PathNotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_root() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        let link = temp_dir.path().join("link");
        fs::create_dir(&target).unwrap();
        symlink(&target, &link).unwrap();

        let config = create_test_config(Some(temp_dir.path().to_path_buf()), true);
        let result = validate_path(link.to_str().unwrap(), &config);

        assert_eq!(result.unwrap(), target.canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_blocked() {
        use std::os::unix::fs::symlink;

        let root_dir = TempDir::new().unwrap();
        let outside_dir = TempDir::new().unwrap();
        let link = root_dir.path().join("link");
        symlink(outside_dir.path(), &link).unwrap();

        let config = create_test_config(Some(root_dir.path().to_path_buf()), true);
        let result = validate_path(link.to_str().unwrap(), &config);

        assert!(matches!(
            result,
            Err(PathSecurityError::SymlinkOutsideRoot { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_disallowed_by_config() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        let link = temp_dir.path().join("link");
        fs::create_dir(&target).unwrap();
        symlink(&target, &link).unwrap();

        let config = create_test_config(Some(temp_dir.path().to_path_buf()), false);
        let result = validate_path(link.to_str().unwrap(), &config);

        assert!(matches!(
            result,
            Err(PathSecurityError::SymlinkNotAllowed { .. })
        ));
    }
}
