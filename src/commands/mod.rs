pub mod channels;
pub mod cluster;
pub mod edit;
pub mod lifecycle;

use crate::cli::PolicyArgs;
use crate::config::{Workspace, expand_path};
use anyhow::Result;
use channel::{OpaPolicy, PolicyFailure};

/// Build the policy gate requested on the command line, if any
pub fn policy(args: &PolicyArgs, workspace: &Workspace) -> Result<Option<OpaPolicy>> {
    let Some(query) = &args.opa_query else {
        return Ok(None);
    };
    let failure = PolicyFailure::from_flags(args.opa_fail, args.opa_fail_defined)?;
    let data = args.opa_data.iter().map(|p| expand_path(p)).collect();
    Ok(Some(workspace.policy(query, data, failure)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkspaceConfig;
    use std::path::PathBuf;

    fn workspace() -> Workspace {
        Workspace {
            context_dir: PathBuf::from("/ws"),
            config: WorkspaceConfig {
                opa: Some("/usr/local/bin/opa".to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_no_query_means_no_policy() {
        assert!(policy(&PolicyArgs::default(), &workspace()).unwrap().is_none());
    }

    #[test]
    fn test_query_builds_policy() {
        let args = PolicyArgs {
            opa_query: Some("data.k8s.deny".to_string()),
            opa_fail_defined: true,
            ..Default::default()
        };
        assert!(policy(&args, &workspace()).unwrap().is_some());
    }

    #[test]
    fn test_conflicting_failure_modes() {
        let args = PolicyArgs {
            opa_query: Some("data.k8s.deny".to_string()),
            opa_fail: true,
            opa_fail_defined: true,
            ..Default::default()
        };
        let err = policy(&args, &workspace()).unwrap_err();
        assert!(err.to_string().contains("cannot both be set"));
    }
}
