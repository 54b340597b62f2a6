//! Workspace configuration.
//!
//! A workspace is marked by a `.wk.yaml` file. Its directory is the context
//! directory: the jsonnet library path and the root channel folders are
//! resolved against. The file optionally overrides the external binaries:
//!
//! ```yaml
//! jsonnet: ~/bin/jsonnet
//! kops: /opt/kops/1.29/kops
//! opa: opa
//! ```

use anyhow::{Context, Result, bail};
use channel::{OpaPolicy, PolicyFailure};
use kopskit::KopsBackend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use template::JsonnetExpander;

/// Workspace marker file name
pub const CONFIG_FILE: &str = ".wk.yaml";

/// Environment variable naming the config file directly
pub const CONFIG_ENV: &str = "WK_CONFIG";

/// Contents of `.wk.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub jsonnet: Option<String>,
    pub kops: Option<String>,
    pub opa: Option<String>,
}

/// A discovered workspace
#[derive(Debug, Clone)]
pub struct Workspace {
    pub context_dir: PathBuf,
    pub config: WorkspaceConfig,
}

impl Workspace {
    /// Find the workspace of `template`, honouring `WK_CONFIG`
    pub fn discover(template: &Path) -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => expand_path(Path::new(&path)),
            None => find_config(template)?,
        };
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config = if content.trim().is_empty() {
            WorkspaceConfig::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid {} format", path.display()))?
        };

        let context_dir = path
            .parent()
            .map(Path::to_path_buf)
            .context("Config file has no parent directory")?;
        log::debug!("Workspace context directory: {}", context_dir.display());

        Ok(Self {
            context_dir,
            config,
        })
    }

    pub fn expander(&self) -> Result<JsonnetExpander> {
        match &self.config.jsonnet {
            Some(binary) => Ok(JsonnetExpander::with_binary(
                expand_path(Path::new(binary)),
                &self.context_dir,
            )),
            None => Ok(JsonnetExpander::new(&self.context_dir)?),
        }
    }

    pub fn provisioner(&self) -> Result<KopsBackend> {
        match &self.config.kops {
            Some(binary) => Ok(KopsBackend::with_binary(expand_path(Path::new(binary)))),
            None => Ok(KopsBackend::new()?),
        }
    }

    pub fn policy(&self, query: &str, data: Vec<PathBuf>, failure: PolicyFailure) -> Result<OpaPolicy> {
        match &self.config.opa {
            Some(binary) => Ok(OpaPolicy::with_binary(
                expand_path(Path::new(binary)),
                query,
                data,
                failure,
            )),
            None => Ok(OpaPolicy::new(query, data, failure)?),
        }
    }
}

/// Walk up from the directory of `template` looking for `.wk.yaml`
pub fn find_config(template: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(template)
        .with_context(|| format!("Could not resolve {}", template.display()))?;
    let start = absolute.parent().unwrap_or(&absolute);

    for dir in start.ancestors() {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    bail!(
        "{CONFIG_FILE} not found in {} or any parent directory",
        start.display()
    )
}

/// Expand a leading `~`
pub fn expand_path(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&text).as_ref())
}
