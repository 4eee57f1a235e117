// Security module for path validation and access control
//
// Every repository path a tool receives passes through `validate_path`
// before git is run against it, so tools cannot reach outside the
// configured root directory.

pub mod path_validator;

pub use path_validator::{PathSecurityError, validate_path};
