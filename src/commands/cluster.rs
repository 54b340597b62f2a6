//! `wk cluster`: reconcile a cluster and its instance groups with a template.
//!
//! The template is rendered once. kops is then asked to edit the cluster and
//! each instance group with wk installed as its editor; every editor
//! invocation merges one fragment and records whether it changed anything in
//! a shared state file. Once all edits are done the state decides whether
//! `kops update cluster` runs.

use crate::Context as AppContext;
use crate::cli::ClusterArgs;
use crate::config::{Workspace, expand_path};
use crate::ui;
use anyhow::{Context, Result, bail};
use channel::PolicyGate;
use kopskit::Provisioner;
use reconcile::{AggregateState, EditorHook, Mode};
use std::path::{Path, PathBuf};
use template::{Expander, expand_cluster};

/// What the caller asked for
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterOptions {
    pub force_update: bool,
    pub preview: bool,
    pub no_update: bool,
}

/// External collaborators of a cluster apply
pub struct Collaborators<'a> {
    pub expander: &'a dyn Expander,
    pub provisioner: &'a dyn Provisioner,
    pub policy: Option<&'a dyn PolicyGate>,
    /// Binary installed as the kops editor
    pub executable: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Preview only; nothing was written
    Previewed,
    Updated,
    /// Nothing changed
    Skipped,
    /// Changes were applied but `--no-update` suppressed the update
    UpdateSuppressed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub cluster: String,
    pub decision: Decision,
    pub requires_update: bool,
    /// Labelled diffs of every changed resource
    pub diffs: String,
}

pub fn run(ctx: &AppContext, args: ClusterArgs) -> Result<()> {
    let file = expand_path(&args.file);
    let workspace = Workspace::discover(&file)?;
    let expander = workspace.expander()?;

    if let Some(dest) = &args.dry {
        let dest = expand_path(dest);
        render_only(&expander, &file, &dest)?;
        if !ctx.quiet {
            ui::success(&format!("Rendered {} to {}", file.display(), dest.display()));
        }
        return Ok(());
    }

    let provisioner = workspace.provisioner()?;
    let policy = super::policy(&args.policy, &workspace)?;
    let executable = std::env::current_exe().context("could not get executable")?;

    let options = ClusterOptions {
        force_update: args.force_update,
        preview: args.preview,
        no_update: args.no_update,
    };
    let report = apply(
        &file,
        options,
        &Collaborators {
            expander: &expander,
            provisioner: &provisioner,
            policy: policy.as_ref().map(|p| p as &dyn PolicyGate),
            executable,
        },
    )?;

    print_report(ctx, &report);
    Ok(())
}

/// Render the template to `dest` without touching the cluster
pub fn render_only(expander: &dyn Expander, template: &Path, dest: &Path) -> Result<()> {
    let (_, rendered) = expand_cluster(expander, template)
        .with_context(|| format!("could not render {}", template.display()))?;
    rendered
        .copy_to(dest)
        .with_context(|| format!("could not write {}", dest.display()))
}

/// Drive one full reconcile of the cluster described by `template`
pub fn apply(template: &Path, options: ClusterOptions, with: &Collaborators<'_>) -> Result<ApplyReport> {
    let (cluster, rendered) = expand_cluster(with.expander, template)
        .with_context(|| format!("could not render {}", template.display()))?;
    cluster.cluster_fragment()?;

    if let Some(policy) = with.policy {
        check_policy(policy, rendered.path(), template)?;
    }

    let state_file = tempfile::Builder::new()
        .prefix("wk-state-")
        .suffix(".json")
        .tempfile()
        .context("could not create state file")?
        .into_temp_path();
    AggregateState::create(&state_file)?;

    let mode = if options.preview {
        Mode::Preview
    } else {
        Mode::Normal
    };
    let hook = EditorHook::new(&with.executable, rendered.path(), &state_file, mode);
    let kops_env = cluster.kops.env_pairs();
    let editor_env = |command: &str| {
        let mut env = kops_env.clone();
        env.extend(EditorHook::env(command));
        env
    };

    log::info!("Editing cluster {}.", cluster.name);
    with.provisioner
        .edit_cluster(&cluster.name, &editor_env(&hook.cluster_command()))
        .context("could not edit cluster")?;

    for ig in &cluster.kops.instance_groups {
        log::info!("Editing instance group: {}", ig.name);
        let env = editor_env(&hook.instance_group_command(&ig.name));

        if !options.preview
            && let Err(e) = with.provisioner.create_instance_group(&cluster.name, &ig.name, &env)
        {
            log::debug!("create ig {}: {e}", ig.name);
        }

        let edited = with.provisioner.edit_instance_group(&cluster.name, &ig.name, &env);
        match edited {
            Ok(()) => {}
            Err(e) if options.preview => {
                log::warn!("Could not preview instance group {}: {e}", ig.name);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("could not edit instance group {}", ig.name));
            }
        }
    }

    let state = AggregateState::load(&state_file)?;
    let requires_update = state.requires_update();
    let report = |decision| ApplyReport {
        cluster: cluster.name.clone(),
        decision,
        requires_update,
        diffs: state.render_diffs(),
    };

    if options.preview {
        return Ok(report(Decision::Previewed));
    }

    if !requires_update && !options.force_update {
        log::info!("Update is not required. Skipping.");
        return Ok(report(Decision::Skipped));
    }

    if options.no_update {
        log::info!("Update is required, but updates are disabled. Skipping.");
        return Ok(report(Decision::UpdateSuppressed));
    }

    log::info!("Update is required. Issuing update.");
    with.provisioner
        .update_cluster(&cluster.name, &kops_env)
        .context("could not update cluster")?;
    Ok(report(Decision::Updated))
}

fn check_policy(policy: &dyn PolicyGate, rendered: &Path, template: &Path) -> Result<()> {
    let verdict = policy
        .evaluate(rendered)
        .with_context(|| format!("could not evaluate policy for {}", template.display()))?;
    if verdict.accepted {
        return Ok(());
    }
    for issue in &verdict.issues {
        log::error!("Issue with file {}: {issue}", template.display());
    }
    bail!(
        "{} rejected by policy ({} issues)",
        template.display(),
        verdict.issues.len()
    )
}

fn print_report(ctx: &AppContext, report: &ApplyReport) {
    if ctx.quiet {
        return;
    }
    match report.decision {
        Decision::Previewed => {
            ui::header(&format!("Preview of {}", report.cluster));
            ui::diff(&report.diffs);
            if report.requires_update {
                ui::warn("An update would be issued.");
            } else {
                ui::info("No update would be issued.");
            }
        }
        Decision::Updated => ui::success(&format!("Cluster {} updated", report.cluster)),
        Decision::Skipped => ui::info(&format!("Cluster {} is up to date", report.cluster)),
        Decision::UpdateSuppressed => {
            ui::warn(&format!(
                "Cluster {} has pending changes; run `wk update` to apply them",
                report.cluster
            ));
        }
    }
    if ctx.verbose > 0 && report.decision != Decision::Previewed {
        ui::diff(&report.diffs);
    }
}
