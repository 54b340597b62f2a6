//! Editor-hook protocol
//!
//! kops only mutates objects through `kops edit`, which runs `$EDITOR` on a
//! temporary file. wk points `EDITOR` at itself with a hidden subcommand:
//!
//! ```text
//! <exe> edit-cluster <rendered> <state> <mode> <live>
//! <exe> edit-instance-group <rendered> <state> <mode> <name> <live>
//! ```
//!
//! kops appends `<live>`. Each invocation merges the matching fragment of the
//! rendered template into the live file and records the outcome in the shared
//! state file.

use crate::error::{Error, Result};
use crate::live::LiveObject;
use crate::merge::{MergeOutcome, merge};
use crate::state::{AggregateState, ResourceId};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use template::Cluster;

/// Hidden subcommand editing the cluster object
pub const EDIT_CLUSTER: &str = "edit-cluster";

/// Hidden subcommand editing one instance group
pub const EDIT_INSTANCE_GROUP: &str = "edit-instance-group";

/// Variables kops consults to pick the editor
pub const EDITOR_ENV_VARS: [&str; 2] = ["EDITOR", "KUBE_EDITOR"];

/// Whether a hook invocation may write the live file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Record the outcome but leave the live file untouched
    Preview,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Preview => "preview",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(Self::Normal),
            "preview" => Ok(Self::Preview),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

/// One parsed hook invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub rendered: PathBuf,
    pub state: PathBuf,
    pub mode: Mode,
    pub target: ResourceId,
    pub live: PathBuf,
}

/// Builds the editor command lines handed to kops
#[derive(Debug, Clone)]
pub struct EditorHook {
    executable: PathBuf,
    rendered: PathBuf,
    state: PathBuf,
    mode: Mode,
}

impl EditorHook {
    pub fn new(executable: &Path, rendered: &Path, state: &Path, mode: Mode) -> Self {
        Self {
            executable: executable.to_path_buf(),
            rendered: rendered.to_path_buf(),
            state: state.to_path_buf(),
            mode,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Editor command for `kops edit cluster`
    pub fn cluster_command(&self) -> String {
        self.command(EDIT_CLUSTER, None)
    }

    /// Editor command for `kops create ig` and `kops edit ig`
    pub fn instance_group_command(&self, name: &str) -> String {
        self.command(EDIT_INSTANCE_GROUP, Some(name))
    }

    /// Environment entries installing `command` as the editor
    pub fn env(command: &str) -> Vec<(String, String)> {
        EDITOR_ENV_VARS
            .iter()
            .map(|var| ((*var).to_string(), command.to_string()))
            .collect()
    }

    fn command(&self, subcommand: &str, instance_group: Option<&str>) -> String {
        let mut parts = vec![
            quote_path(&self.executable),
            Cow::Borrowed(subcommand),
            quote_path(&self.rendered),
            quote_path(&self.state),
            Cow::Borrowed(self.mode.as_str()),
        ];
        if let Some(name) = instance_group {
            parts.push(shell_escape::escape(Cow::Borrowed(name)));
        }
        parts.join(" ")
    }
}

fn quote_path(path: &Path) -> Cow<'_, str> {
    shell_escape::escape(path.to_string_lossy())
}

/// Execute one hook invocation.
///
/// Selects the desired fragment from the rendered template, merges it into
/// the live file (unless previewing) and records the outcome in the state
/// file.
pub fn run(request: &EditRequest) -> Result<MergeOutcome> {
    let cluster = Cluster::load(&request.rendered)?;
    let desired = match &request.target {
        ResourceId::Cluster => cluster.cluster_fragment()?,
        ResourceId::InstanceGroup(name) => {
            &cluster
                .instance_group(name)
                .ok_or_else(|| Error::InstanceGroupNotFound { name: name.clone() })?
                .value
        }
    };

    let live = LiveObject::read(&request.live)?;
    let outcome = merge(live.value(), desired)?;

    if outcome.changed {
        log::info!("{} changed:\n{}", request.target, outcome.diff);
        match request.mode {
            Mode::Normal => live.write(&outcome.merged)?,
            Mode::Preview => log::debug!("Preview mode, leaving {} untouched", live.path().display()),
        }
    } else {
        log::debug!("{} unchanged", request.target);
    }

    AggregateState::mutate(&request.state, |state| state.record(&request.target, &outcome))?;
    Ok(outcome)
}
