//! Aggregate state shared by every editor-hook invocation of one operation
//!
//! The file is created empty by the orchestrator, mutated once per edited
//! resource by the hook processes, then read back to decide whether
//! `kops update cluster` has to run. Every mutation is a full
//! read-modify-write under an exclusive advisory lock.

use crate::error::{Error, Result};
use crate::merge::MergeOutcome;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Text returned by [`AggregateState::render_diffs`] when nothing changed
pub const NO_CHANGES: &str = "No changes.";

/// Outcome of the last edit of one resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectState {
    #[serde(default)]
    pub update_required: bool,
    #[serde(default)]
    pub diff_text: String,
}

/// Per-resource outcomes for the cluster and its instance groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AggregateState {
    #[serde(default)]
    pub cluster: ObjectState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instance_groups: BTreeMap<String, ObjectState>,
}

/// Key under which a resource's outcome is recorded
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Cluster,
    InstanceGroup(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster => write!(f, "Cluster"),
            Self::InstanceGroup(name) => write!(f, "Instance Group {name}"),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl AggregateState {
    /// Write a fresh, empty state to `path`
    pub fn create(path: &Path) -> Result<Self> {
        let state = Self::default();
        state.save(path)?;
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec(self).map_err(|source| Error::State {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, bytes).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        file.lock_shared().map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        read_locked(&mut file, path)
    }

    /// Apply `update` to the state stored at `path` and write it back.
    ///
    /// The file stays exclusively locked from the read to the write.
    pub fn mutate(path: &Path, update: impl FnOnce(&mut Self)) -> Result<Self> {
        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(io_err)?;
        file.lock().map_err(io_err)?;

        let mut state = read_locked(&mut file, path)?;
        update(&mut state);

        let bytes = serde_json::to_vec(&state).map_err(|source| Error::State {
            path: path.to_path_buf(),
            source,
        })?;
        file.set_len(0).map_err(io_err)?;
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.flush().map_err(io_err)?;

        Ok(state)
    }

    /// Record the outcome of a merge for `id`.
    ///
    /// A resource may pass through the hook more than once per operation
    /// (`create ig` then `edit ig`). Once flagged it stays flagged, and later
    /// diffs are appended.
    pub fn record(&mut self, id: &ResourceId, outcome: &MergeOutcome) {
        let entry = match id {
            ResourceId::Cluster => &mut self.cluster,
            ResourceId::InstanceGroup(name) => self.instance_groups.entry(name.clone()).or_default(),
        };
        if !outcome.changed {
            return;
        }
        entry.update_required = true;
        if !outcome.diff.is_empty() {
            if !entry.diff_text.is_empty() {
                entry.diff_text.push('\n');
            }
            entry.diff_text.push_str(&outcome.diff);
        }
    }

    pub fn get(&self, id: &ResourceId) -> Option<&ObjectState> {
        match id {
            ResourceId::Cluster => Some(&self.cluster),
            ResourceId::InstanceGroup(name) => self.instance_groups.get(name),
        }
    }

    /// True when the cluster or any instance group changed
    pub fn requires_update(&self) -> bool {
        self.cluster.update_required || self.instance_groups.values().any(|ig| ig.update_required)
    }

    /// Every non-empty diff labelled with its resource, or [`NO_CHANGES`]
    pub fn render_diffs(&self) -> String {
        let mut out = String::new();
        if !self.cluster.diff_text.is_empty() {
            out.push_str(&format!(
                "{} changed:\n{}\n\n",
                ResourceId::Cluster,
                self.cluster.diff_text
            ));
        }
        for (name, ig) in &self.instance_groups {
            if !ig.diff_text.is_empty() {
                out.push_str(&format!(
                    "{} changed:\n{}\n\n",
                    ResourceId::InstanceGroup(name.clone()),
                    ig.diff_text
                ));
            }
        }
        if out.is_empty() {
            return NO_CHANGES.to_string();
        }
        out
    }
}

fn read_locked(file: &mut File, path: &Path) -> Result<AggregateState> {
    let mut content = String::new();
    file.read_to_string(&mut content).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(AggregateState::default());
    }
    serde_json::from_str(&content).map_err(|source| Error::State {
        path: path.to_path_buf(),
        source,
    })
}
