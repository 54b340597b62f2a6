use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use reconcile::Mode;
use reconcile::hook::{EDIT_CLUSTER, EDIT_INSTANCE_GROUP};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wk")]
#[command(version)]
#[command(about = "Declarative kops cluster management driven by jsonnet templates", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log everything (same as -vv)
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile a cluster and its instance groups with a template
    Cluster(ClusterArgs),

    /// Build the addon channels declared by a template
    Channels(ChannelsArgs),

    /// Create a cluster with the flags declared by a template
    Create(TemplateArgs),

    /// Run `kops update cluster` unconditionally
    Update(TemplateArgs),

    /// Delete a cluster
    Delete(TemplateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Editor hook for `kops edit cluster`
    #[command(name = EDIT_CLUSTER, hide = true)]
    EditCluster(EditClusterArgs),

    /// Editor hook for `kops create ig` and `kops edit ig`
    #[command(name = EDIT_INSTANCE_GROUP, hide = true)]
    EditInstanceGroup(EditInstanceGroupArgs),
}

// ============================================================================
// Template commands
// ============================================================================

#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Cluster template (.jsonnet)
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ClusterArgs {
    /// Cluster template (.jsonnet)
    pub file: PathBuf,

    /// Write the rendered template to PATH and stop
    #[arg(long, value_name = "PATH")]
    pub dry: Option<PathBuf>,

    /// Run `kops update cluster` even when nothing changed
    #[arg(short, long)]
    pub force_update: bool,

    /// Show what would change without touching the cluster
    #[arg(short, long, conflicts_with = "dry")]
    pub preview: bool,

    /// Apply edits but never run `kops update cluster`
    #[arg(short, long)]
    pub no_update: bool,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Args, Debug)]
pub struct ChannelsArgs {
    /// Cluster template (.jsonnet)
    pub file: PathBuf,

    /// Write artifacts and channel.yaml under DIR/<channel>
    #[arg(long, value_name = "DIR")]
    pub dry: Option<PathBuf>,

    /// Worker threads per channel (default: one per file)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Args, Debug, Default, Clone)]
pub struct PolicyArgs {
    /// OPA query evaluated with each rendered document as input
    #[arg(long, value_name = "QUERY")]
    pub opa_query: Option<String>,

    /// Rego file to load (repeatable)
    #[arg(long, value_name = "FILE", requires = "opa_query")]
    pub opa_data: Vec<PathBuf>,

    /// Fail on an empty or undefined query result
    #[arg(long, requires = "opa_query")]
    pub opa_fail: bool,

    /// Fail on a defined, non-empty query result
    #[arg(long, requires = "opa_query")]
    pub opa_fail_defined: bool,
}

// ============================================================================
// Editor hooks
// ============================================================================

#[derive(Args, Debug)]
pub struct EditClusterArgs {
    /// Rendered template
    pub rendered: PathBuf,
    /// Shared state file
    pub state: PathBuf,
    /// normal or preview
    pub mode: Mode,
    /// Live object file appended by kops
    pub live: PathBuf,
}

#[derive(Args, Debug)]
pub struct EditInstanceGroupArgs {
    /// Rendered template
    pub rendered: PathBuf,
    /// Shared state file
    pub state: PathBuf,
    /// normal or preview
    pub mode: Mode,
    /// Instance group name
    pub name: String,
    /// Live object file appended by kops
    pub live: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_edit_instance_group() {
        let cli = Cli::try_parse_from([
            "wk",
            "edit-instance-group",
            "/tmp/r.json",
            "/tmp/s.json",
            "preview",
            "nodes",
            "/tmp/live.yaml",
        ])
        .unwrap();

        let Command::EditInstanceGroup(args) = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(args.mode, Mode::Preview);
        assert_eq!(args.name, "nodes");
        assert_eq!(args.live, PathBuf::from("/tmp/live.yaml"));
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let result = Cli::try_parse_from([
            "wk",
            "edit-cluster",
            "/tmp/r.json",
            "/tmp/s.json",
            "dry",
            "/tmp/live.yaml",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cluster_flags() {
        let cli = Cli::try_parse_from([
            "wk", "-v", "cluster", "prod.jsonnet", "-n", "--opa-query", "data.k8s.deny",
            "--opa-data", "a.rego", "--opa-data", "b.rego", "--opa-fail-defined",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        let Command::Cluster(args) = cli.command else {
            panic!("wrong command");
        };
        assert!(args.no_update);
        assert!(!args.force_update);
        assert_eq!(args.policy.opa_data.len(), 2);
        assert!(args.policy.opa_fail_defined);
    }

    #[test]
    fn test_preview_conflicts_with_dry() {
        let result = Cli::try_parse_from(["wk", "cluster", "prod.jsonnet", "-p", "--dry", "out.json"]);
        assert!(result.is_err());
    }
}
