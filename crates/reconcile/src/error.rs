//! Error types for the reconcile crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reconciling a live object
#[derive(Error, Debug)]
pub enum Error {
    /// IO error on a live object or state file
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Live object could not be parsed
    #[error("could not parse live object {}: {source}", .path.display())]
    MalformedLive {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A document that must be an object is some other shape
    #[error("{what} is not an object")]
    NotAnObject { what: String },

    /// No instance-group fragment with the requested name
    #[error("instance group {name:?}: name not found in rendered template")]
    InstanceGroupNotFound { name: String },

    /// State file could not be parsed or serialized
    #[error("invalid state file {}: {source}", .path.display())]
    State {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Unknown editor mode
    #[error("invalid mode {0:?} (expected \"normal\" or \"preview\")")]
    InvalidMode(String),

    /// Serialization of a merged object failed
    #[error("could not serialize {what}: {message}")]
    Serialize { what: String, message: String },

    /// Rendered template could not be loaded
    #[error(transparent)]
    Template(#[from] template::Error),
}

/// Result type for reconcile operations
pub type Result<T> = std::result::Result<T, Error>;
