//! `wk create`, `wk update` and `wk delete`.

use crate::Context as AppContext;
use crate::cli::TemplateArgs;
use crate::config::{Workspace, expand_path};
use crate::ui;
use anyhow::{Context, Result};
use kopskit::Provisioner;
use std::path::Path;
use template::{Cluster, Expander, expand_cluster};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Create,
    Update,
    Delete,
}

impl Lifecycle {
    fn past_tense(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }
}

pub fn run(ctx: &AppContext, action: Lifecycle, args: TemplateArgs) -> Result<()> {
    let file = expand_path(&args.file);
    let workspace = Workspace::discover(&file)?;
    let expander = workspace.expander()?;
    let provisioner = workspace.provisioner()?;

    let cluster = execute(action, &file, &expander, &provisioner)?;
    if !ctx.quiet {
        ui::success(&format!("Cluster {} {}", cluster.name, action.past_tense()));
    }
    Ok(())
}

/// Render `template` and run the kops command for `action`
pub fn execute(
    action: Lifecycle,
    template: &Path,
    expander: &dyn Expander,
    provisioner: &dyn Provisioner,
) -> Result<Cluster> {
    let (cluster, _rendered) = expand_cluster(expander, template)
        .with_context(|| format!("could not render {}", template.display()))?;
    let env = cluster.kops.env_pairs();

    match action {
        Lifecycle::Create => {
            log::info!("Creating cluster {}.", cluster.name);
            provisioner
                .create_cluster(&cluster.name, &cluster.kops.create_flags(), &env)
                .context("could not create cluster")?;
        }
        Lifecycle::Update => {
            log::info!("Updating cluster {}.", cluster.name);
            provisioner
                .update_cluster(&cluster.name, &env)
                .context("could not update cluster")?;
        }
        Lifecycle::Delete => {
            log::info!("Deleting cluster {}.", cluster.name);
            provisioner
                .delete_cluster(&cluster.name, &env)
                .context("could not delete cluster")?;
        }
    }
    Ok(cluster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kopskit::KopsCommand;
    use std::sync::Mutex;
    use template::{Bindings, Rendered};

    struct FixedTemplate;

    impl Expander for FixedTemplate {
        fn expand(&self, _template: &Path, _bindings: &Bindings) -> template::Result<Rendered> {
            Rendered::from_content(
                br#"{"name": "prod.k8s.local", "kops": {
                    "env": {"KOPS_STATE_STORE": "s3://state"},
                    "create": {"zones": "us-east-1a", "node-count": 3}
                }}"#
                .to_vec(),
            )
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(KopsCommand, Vec<(String, String)>)>>,
        fail: bool,
    }

    impl Provisioner for Recorder {
        fn run(&self, command: &KopsCommand, env: &kopskit::Env) -> kopskit::Result<()> {
            self.calls.lock().unwrap().push((command.clone(), env.to_vec()));
            if self.fail {
                return Err(kopskit::Error::CommandFailed {
                    command: command.to_string(),
                    status: "exit status: 1".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_create_passes_flags_and_env() {
        let kops = Recorder::default();
        execute(Lifecycle::Create, Path::new("prod.jsonnet"), &FixedTemplate, &kops).unwrap();

        let calls = kops.calls.lock().unwrap();
        let (command, env) = &calls[0];
        assert_eq!(
            command.args(),
            ["create", "cluster", "--node-count=3", "--zones=us-east-1a", "--name=prod.k8s.local"]
        );
        assert_eq!(env, &[("KOPS_STATE_STORE".to_string(), "s3://state".to_string())]);
    }

    #[test]
    fn test_update_and_delete() {
        let kops = Recorder::default();
        execute(Lifecycle::Update, Path::new("prod.jsonnet"), &FixedTemplate, &kops).unwrap();
        execute(Lifecycle::Delete, Path::new("prod.jsonnet"), &FixedTemplate, &kops).unwrap();

        let commands: Vec<String> = kops
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _)| c.to_string())
            .collect();
        assert_eq!(
            commands,
            [
                "kops update cluster --name=prod.k8s.local -v1 --yes",
                "kops delete cluster --name=prod.k8s.local --yes",
            ]
        );
    }

    #[test]
    fn test_failure_is_fatal() {
        let kops = Recorder {
            fail: true,
            ..Default::default()
        };
        let err = execute(Lifecycle::Delete, Path::new("prod.jsonnet"), &FixedTemplate, &kops)
            .unwrap_err();
        assert_eq!(err.to_string(), "could not delete cluster");
    }
}
