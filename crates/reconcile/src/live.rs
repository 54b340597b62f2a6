//! Live object files handed over by kops
//!
//! kops writes the object under edit as YAML. After a failed edit it
//! re-opens the same file with a block of `#` comment lines describing the
//! error at the top; those lines are echoed to the log.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker kops leaves in its error annotation block
const ANNOTATION_MARKER: &str = "# ...";

/// A live object read from the path kops passed to the editor
#[derive(Debug, Clone)]
pub struct LiveObject {
    path: PathBuf,
    value: Value,
}

impl LiveObject {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        for line in annotation_lines(&content) {
            log::info!("{line}");
        }

        let value: Value = serde_yaml::from_str(&content).map_err(|source| Error::MalformedLive {
            path: path.to_path_buf(),
            source,
        })?;
        if !value.is_object() {
            return Err(Error::NotAnObject {
                what: format!("live object {}", path.display()),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            value,
        })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents with `value` as YAML
    pub fn write(&self, value: &Value) -> Result<()> {
        let yaml = serde_yaml::to_string(value).map_err(|e| Error::Serialize {
            what: format!("live object {}", self.path.display()),
            message: e.to_string(),
        })?;
        fs::write(&self.path, yaml).map_err(|source| Error::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Leading comment lines of an annotated live file
fn annotation_lines(content: &str) -> Vec<&str> {
    if !content.starts_with('#') || !content.contains(ANNOTATION_MARKER) {
        return Vec::new();
    }
    content
        .lines()
        .take_while(|line| line.starts_with('#'))
        .collect()
}
