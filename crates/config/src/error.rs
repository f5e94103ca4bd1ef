//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No user name could be found to namespace the cache root. Set `USER`
    /// (or `SCENT_USER`), or configure `root` explicitly.
    #[display("current user name is not set")]
    MissingUser,
    /// The configured cache root is not an absolute path.
    #[display("cache root must be absolute: {}", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    /// A configuration source could not be read or deserialized.
    #[display("invalid configuration source")]
    Provider,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Configuration is either valid or it isn't.
        false
    }
}
