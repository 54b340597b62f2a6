//! `jsonnet` CLI expander

use crate::error::{Error, Result};
use crate::expander::{Bindings, Expander, Rendered};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Helper library exposed to every template as `std.extVar('kops')`
const KOPS_HELPERS: &str = r"kops={
  cluster:: {},
  instanceGroup:: function(n){name:n, value:{}},
  channel:: function(bucket, cluster, name, apps=[], folder='') {
    name: name,
    path: bucket + '/' + cluster + '/' + name,
    apps: apps,
    folder: folder,
  },
  file:: function(path) {
    type: 'file',
    app: '',
    path: path,
  },
  apps:: function(path) {
    type: 'apps',
    app: '',
    path: path,
  },
}";

/// Prefix of environment variables forwarded to templates
const ENV_PREFIX: &str = "WK";

/// Expander backed by the `jsonnet` binary
#[derive(Debug, Clone)]
pub struct JsonnetExpander {
    binary: PathBuf,
    library_dir: PathBuf,
}

impl JsonnetExpander {
    /// Locate `jsonnet` on PATH.
    ///
    /// `library_dir` is added to the import search path (`-J`).
    pub fn new(library_dir: &Path) -> Result<Self> {
        let binary = which::which("jsonnet").map_err(|_| Error::ExpanderNotFound)?;
        Ok(Self::with_binary(binary, library_dir))
    }

    pub fn with_binary(binary: PathBuf, library_dir: &Path) -> Self {
        Self {
            binary,
            library_dir: library_dir.to_path_buf(),
        }
    }

    fn args(&self, template: &Path, bindings: &Bindings, output: &Path) -> Vec<String> {
        let mut args = Vec::new();

        if bindings.yaml_stream {
            args.push("-y".to_string());
        }
        if let Some(cluster_file) = &bindings.cluster_file {
            args.push("--ext-code-file".to_string());
            args.push(format!("cluster={}", cluster_file.display()));
        }

        args.extend([
            "--ext-code".to_string(),
            KOPS_HELPERS.to_string(),
            "--ext-code".to_string(),
            env_binding(std::env::vars()),
            "--ext-code".to_string(),
            "wk=true".to_string(),
            "-J".to_string(),
            self.library_dir.display().to_string(),
            "-o".to_string(),
            output.display().to_string(),
            template.display().to_string(),
        ]);
        args
    }
}

impl Expander for JsonnetExpander {
    fn expand(&self, template: &Path, bindings: &Bindings) -> Result<Rendered> {
        let output = tempfile::Builder::new()
            .prefix("wk-rendered-")
            .suffix(".json")
            .tempfile()
            .map_err(|source| Error::Io {
                path: std::env::temp_dir(),
                source,
            })?
            .into_temp_path();

        log::debug!("Expanding {}", template.display());

        let status = Command::new(&self.binary)
            .args(self.args(template, bindings, &output))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| Error::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !status.success() {
            return Err(Error::ExpansionFailed {
                template: template.to_path_buf(),
                status: status.to_string(),
            });
        }

        let content = fs::read(&output).map_err(|source| Error::Io {
            path: output.to_path_buf(),
            source,
        })?;

        Ok(Rendered::new(content, output))
    }
}

/// Build the `env` ext-code object from all `WK*` variables
fn env_binding(vars: impl Iterator<Item = (String, String)>) -> String {
    let mut pairs: Vec<(String, String)> =
        vars.filter(|(key, _)| key.starts_with(ENV_PREFIX)).collect();
    pairs.sort();

    let mut out = String::from("env={");
    for (key, value) in pairs {
        out.push_str(&format!("{key}:'{}',", escape_single_quoted(&value)));
    }
    out.push('}');
    out
}

fn escape_single_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
