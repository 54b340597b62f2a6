//! `wk channels`: build the addon channels declared by a template.

use crate::Context as AppContext;
use crate::cli::ChannelsArgs;
use crate::config::{Workspace, expand_path};
use crate::progress::ChannelBars;
use crate::ui;
use anyhow::{Context, Result};
use channel::{
    BuildOptions, Channel, ChannelOutput, MANIFEST_FILE, PolicyGate, ProgressCallback,
    build_channel,
};
use std::path::Path;
use template::{Expander, expand_cluster};

/// A built channel and where it was written
#[derive(Debug)]
pub struct BuiltChannel {
    pub name: String,
    pub output: ChannelOutput,
}

/// Settings shared by every channel of one run
pub struct ChannelRun<'a> {
    pub context_dir: &'a Path,
    pub expander: &'a dyn Expander,
    pub policy: Option<&'a dyn PolicyGate>,
    /// Channels are written to `<dry>/<channel name>/`
    pub dry: Option<&'a Path>,
    pub jobs: Option<usize>,
}

pub fn run(ctx: &AppContext, args: ChannelsArgs) -> Result<()> {
    let file = expand_path(&args.file);
    let workspace = Workspace::discover(&file)?;
    let expander = workspace.expander()?;
    let policy = super::policy(&args.policy, &workspace)?;
    let dry = args.dry.as_deref().map(expand_path);

    let progress = ChannelBars::new(ctx.quiet);
    let built = build_all(
        &file,
        &ChannelRun {
            context_dir: &workspace.context_dir,
            expander: &expander,
            policy: policy.as_ref().map(|p| p as &dyn PolicyGate),
            dry: dry.as_deref(),
            jobs: args.jobs,
        },
        &progress,
    )?;

    if ctx.quiet {
        return Ok(());
    }
    if built.is_empty() {
        ui::info("No channels with a folder are declared.");
        return Ok(());
    }
    for channel in &built {
        ui::success(&format!(
            "Channel {}: {} addons",
            channel.name,
            channel.output.items.len()
        ));
        match &dry {
            Some(dir) => ui::dim(&dir.join(&channel.name).join(MANIFEST_FILE).display().to_string()),
            None => {
                for item in &channel.output.items {
                    ui::kv(&item.relative_path, &item.hash);
                }
            }
        }
    }
    Ok(())
}

/// Build every channel of `template`, stopping at the first failed channel
pub fn build_all(
    template: &Path,
    run: &ChannelRun<'_>,
    progress: &dyn ProgressCallback,
) -> Result<Vec<BuiltChannel>> {
    let (cluster, rendered) = expand_cluster(run.expander, template)
        .with_context(|| format!("could not render {}", template.display()))?;

    let mut built = Vec::new();
    for spec in &cluster.kops.channels {
        let Some(channel) = Channel::from_spec(spec, run.context_dir)? else {
            log::debug!("Channel {} has no folder, skipping", spec.name);
            continue;
        };

        let output_dir = run.dry.map(|dir| dir.join(&channel.name));
        let options = BuildOptions {
            cluster_file: rendered.path(),
            output_dir: output_dir.as_deref(),
            jobs: run.jobs,
            policy: run.policy,
        };
        let output = build_channel(&channel, run.expander, options, progress)
            .with_context(|| format!("could not generate channel {}", channel.name))?;

        log::info!("Channel {}: {} addons", channel.name, output.items.len());
        built.push(BuiltChannel {
            name: channel.name,
            output,
        });
    }
    Ok(built)
}
