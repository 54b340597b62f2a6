//! Hidden editor-hook subcommands.
//!
//! kops runs these as `$EDITOR`, appending the live object path.

use crate::cli::{EditClusterArgs, EditInstanceGroupArgs};
use anyhow::{Context, Result};
use reconcile::{EditRequest, MergeOutcome, ResourceId, hook};

pub fn cluster(args: EditClusterArgs) -> Result<()> {
    run(&EditRequest {
        rendered: args.rendered,
        state: args.state,
        mode: args.mode,
        target: ResourceId::Cluster,
        live: args.live,
    })
    .map(drop)
}

pub fn instance_group(args: EditInstanceGroupArgs) -> Result<()> {
    run(&EditRequest {
        rendered: args.rendered,
        state: args.state,
        mode: args.mode,
        target: ResourceId::InstanceGroup(args.name),
        live: args.live,
    })
    .map(drop)
}

fn run(request: &EditRequest) -> Result<MergeOutcome> {
    log::debug!(
        "Editing {} in {} mode ({})",
        request.target,
        request.mode,
        request.live.display()
    );
    hook::run(request).with_context(|| format!("could not edit {}", request.target))
}
