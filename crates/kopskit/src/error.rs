//! Error types for kops operations

use thiserror::Error;

/// Errors that can occur while driving kops
#[derive(Error, Debug)]
pub enum Error {
    /// kops not found in PATH
    #[error("kops not found in PATH")]
    NotFound,

    /// kops could not be started
    #[error("could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// kops exited unsuccessfully
    #[error("`{command}` failed: {status}")]
    CommandFailed { command: String, status: String },
}

/// Result type for kops operations
pub type Result<T> = std::result::Result<T, Error>;
