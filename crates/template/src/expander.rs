//! Template expansion seam
//!
//! The [`Expander`] trait abstracts the template engine so callers can run
//! against the real `jsonnet` binary or an in-memory fake in tests.

use crate::error::{Error, Result};
use crate::types::Cluster;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Extra bindings passed to a single expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    /// Rendered cluster document exposed to the template as `cluster`
    pub cluster_file: Option<PathBuf>,
    /// Render a YAML stream instead of a single JSON document
    pub yaml_stream: bool,
}

impl Bindings {
    /// Bindings for a top-level cluster template
    pub fn cluster() -> Self {
        Self::default()
    }

    /// Bindings for a channel app template, which sees the rendered cluster
    pub fn app(cluster_file: &Path) -> Self {
        Self {
            cluster_file: Some(cluster_file.to_path_buf()),
            yaml_stream: true,
        }
    }
}

/// Output of one expansion: the rendered bytes and the file holding them.
///
/// The file is removed when the value is dropped.
#[derive(Debug)]
pub struct Rendered {
    content: Vec<u8>,
    path: TempPath,
}

impl Rendered {
    pub fn new(content: Vec<u8>, path: TempPath) -> Self {
        Self { content, path }
    }

    /// Write `content` to a fresh temporary file
    pub fn from_content(content: Vec<u8>) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("wk-rendered-")
            .suffix(".json")
            .tempfile()
            .map_err(|source| Error::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let path = file.into_temp_path();
        fs::write(&path, &content).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { content, path })
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the template rendered nothing but whitespace
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(u8::is_ascii_whitespace)
    }

    /// Copy the rendered file to `dest`, creating parent directories
    pub fn copy_to(&self, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(dest, &self.content).map_err(|source| Error::Io {
            path: dest.to_path_buf(),
            source,
        })
    }
}

/// A template engine
pub trait Expander: Send + Sync {
    /// Expand `template` with `bindings` into a rendered file
    fn expand(&self, template: &Path, bindings: &Bindings) -> Result<Rendered>;
}

/// Expand a cluster template and parse the result.
///
/// The rendered file is returned alongside the parsed document because the
/// editor hook re-reads it from disk in every self-invocation.
pub fn expand_cluster(expander: &dyn Expander, template: &Path) -> Result<(Cluster, Rendered)> {
    let rendered = expander.expand(template, &Bindings::cluster())?;
    let cluster = Cluster::from_slice(rendered.content(), template)?;
    log::debug!(
        "Rendered cluster {} from {} into {}",
        cluster.name,
        template.display(),
        rendered.path().display()
    );
    Ok((cluster, rendered))
}
