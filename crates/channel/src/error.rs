//! Error types for the channel crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building a channel
#[derive(Error, Debug)]
pub enum Error {
    /// File filter is not a valid regular expression
    #[error("invalid file filter {pattern:?}: {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// IO error
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Worker pool could not be created
    #[error("could not create worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// One or more files failed to expand or were rejected
    #[error("{count} errors encountered compiling channel {name}")]
    ChannelFailed { name: String, count: usize },

    /// `opa` not found in PATH
    #[error("opa not found in PATH")]
    PolicyEngineNotFound,

    /// Both policy failure modes requested
    #[error("--opa-fail and --opa-fail-defined cannot both be set")]
    ConflictingFailureModes,

    /// Policy engine could not be started
    #[error("could not run {}: {source}", .binary.display())]
    PolicySpawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Policy engine exited unsuccessfully
    #[error("policy evaluation failed ({status}): {stderr}")]
    PolicyFailed { status: String, stderr: String },

    /// Policy engine output could not be parsed
    #[error("unexpected policy engine output: {0}")]
    PolicyOutput(#[source] serde_json::Error),

    /// Query text not present in the evaluation result
    #[error("query {0:?} not found in policy result")]
    QueryNotFound(String),

    /// A document of a rendered artifact is not JSON
    #[error("malformed document in {}: {source}", .path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Manifest could not be serialized
    #[error("could not render manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),

    /// Template expansion failed
    #[error(transparent)]
    Template(#[from] template::Error),
}

/// Result type for channel operations
pub type Result<T> = std::result::Result<T, Error>;
