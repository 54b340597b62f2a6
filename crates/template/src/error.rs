//! Error types for template expansion

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while expanding or loading cluster templates
#[derive(Error, Debug)]
pub enum Error {
    /// The template engine binary could not be located
    #[error("jsonnet not found in PATH (install go-jsonnet or set `jsonnet` in .wk.yaml)")]
    ExpanderNotFound,

    /// The template engine could not be started
    #[error("failed to execute {}: {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template engine ran but reported a failure
    #[error("could not render {}: jsonnet exited with {status}", .template.display())]
    ExpansionFailed { template: PathBuf, status: String },

    /// Reading or writing a rendered file failed
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rendered output is not a valid cluster document
    #[error("malformed template output in {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The cluster document has no `kops` section
    #[error("kops configuration is missing in {}", .path.display())]
    MissingKops { path: PathBuf },

    /// The `kops` section has no cluster fragment
    #[error("cluster fragment `kops.cluster` is missing for cluster {name}")]
    MissingCluster { name: String },
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, Error>;
