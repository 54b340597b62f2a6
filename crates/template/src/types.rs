//! Rendered cluster document model
//!
//! A cluster template renders to a single JSON document:
//!
//! ```json
//! {
//!   "name": "prod.k8s.example.com",
//!   "kops": {
//!     "env": { "KOPS_STATE_STORE": "s3://state" },
//!     "create": { "zones": "us-east-1a" },
//!     "cluster": { "spec": { "kubernetesVersion": "1.29.3" } },
//!     "instanceGroups": [ { "name": "nodes", "value": { "spec": { "maxSize": 3 } } } ],
//!     "channels": [ { "name": "addons", "path": "s3://bucket/prod/addons", "folder": "addons" } ]
//!   }
//! }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A fully rendered cluster template with its kops section present
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Cluster name as known to kops (`--name`)
    pub name: String,
    /// Everything wk manages through kops
    pub kops: KopsSpec,
}

/// The `kops` section of a cluster document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KopsSpec {
    /// Extra environment for every kops invocation
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Flags for `kops create cluster`
    #[serde(default)]
    pub create: BTreeMap<String, Value>,

    /// Desired-state fragment merged into the live cluster object
    #[serde(default)]
    pub cluster: Option<Value>,

    /// Desired-state fragments for instance groups, in apply order
    #[serde(default)]
    pub instance_groups: Vec<InstanceGroupSpec>,

    /// Channel (addon bundle) definitions
    #[serde(default)]
    pub channels: Vec<ChannelSpec>,
}

/// A named instance-group fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceGroupSpec {
    pub name: String,
    #[serde(default = "empty_object")]
    pub value: Value,
}

/// A channel definition as rendered by the `kops.channel` helper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSpec {
    pub name: String,

    /// Remote location the channel is published to
    #[serde(default)]
    pub path: String,

    /// Folder of templates, relative to the workspace context directory
    #[serde(default)]
    pub folder: String,

    /// Overrides the default `\.jsonnet$` file filter
    #[serde(default)]
    pub file_whitelist_regexp: Option<String>,
}

#[derive(Deserialize)]
struct RawCluster {
    #[serde(default)]
    name: String,
    #[serde(default)]
    kops: Option<KopsSpec>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Cluster {
    /// Parse a rendered cluster document.
    ///
    /// `origin` is only used for error messages.
    pub fn from_slice(bytes: &[u8], origin: &Path) -> Result<Self> {
        let raw: RawCluster = serde_json::from_slice(bytes).map_err(|source| Error::Malformed {
            path: origin.to_path_buf(),
            source,
        })?;

        let kops = raw.kops.ok_or_else(|| Error::MissingKops {
            path: origin.to_path_buf(),
        })?;

        Ok(Self {
            name: raw.name,
            kops,
        })
    }

    /// Load a rendered cluster document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes, path)
    }

    /// The cluster fragment, required by anything that reconciles the cluster
    pub fn cluster_fragment(&self) -> Result<&Value> {
        match &self.kops.cluster {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(Error::MissingCluster {
                name: self.name.clone(),
            }),
        }
    }

    /// Find an instance-group fragment by name
    pub fn instance_group(&self, name: &str) -> Option<&InstanceGroupSpec> {
        self.kops.instance_groups.iter().find(|ig| ig.name == name)
    }
}

impl KopsSpec {
    /// Render `create` as `--key=value` flags, in key order
    pub fn create_flags(&self) -> Vec<String> {
        self.create
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("--{key}={s}"),
                other => format!("--{key}={other}"),
            })
            .collect()
    }

    /// Environment pairs for kops subprocesses
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        self.env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
