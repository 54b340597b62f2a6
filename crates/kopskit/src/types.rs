//! kops invocations

use std::fmt;

/// Extra environment for a kops subprocess
pub type Env = [(String, String)];

/// One kops invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KopsCommand {
    /// `kops create cluster <flags> --name=<name>`
    CreateCluster { name: String, flags: Vec<String> },
    /// `kops edit cluster --name=<name>`
    EditCluster { name: String },
    /// `kops create ig --name=<cluster> <name>`
    CreateInstanceGroup { cluster: String, name: String },
    /// `kops edit ig --name=<cluster> <name>`
    EditInstanceGroup { cluster: String, name: String },
    /// `kops update cluster --name=<name> -v1 --yes`
    UpdateCluster { name: String },
    /// `kops delete cluster --name=<name> --yes`
    DeleteCluster { name: String },
}

impl KopsCommand {
    pub fn args(&self) -> Vec<String> {
        let name_flag = |name: &str| format!("--name={name}");
        match self {
            Self::CreateCluster { name, flags } => {
                let mut args = vec!["create".to_string(), "cluster".to_string()];
                args.extend(flags.iter().cloned());
                args.push(name_flag(name));
                args
            }
            Self::EditCluster { name } => vec!["edit".into(), "cluster".into(), name_flag(name)],
            Self::CreateInstanceGroup { cluster, name } => {
                vec!["create".into(), "ig".into(), name_flag(cluster), name.clone()]
            }
            Self::EditInstanceGroup { cluster, name } => {
                vec!["edit".into(), "ig".into(), name_flag(cluster), name.clone()]
            }
            Self::UpdateCluster { name } => vec![
                "update".into(),
                "cluster".into(),
                name_flag(name),
                "-v1".into(),
                "--yes".into(),
            ],
            Self::DeleteCluster { name } => {
                vec!["delete".into(), "cluster".into(), name_flag(name), "--yes".into()]
            }
        }
    }

    /// Output of `create ig` is noise when the group already exists, so it is
    /// captured rather than streamed to the terminal
    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::CreateInstanceGroup { .. })
    }
}

impl fmt::Display for KopsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kops {}", self.args().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_cluster_args() {
        let command = KopsCommand::CreateCluster {
            name: "prod".into(),
            flags: vec!["--zones=us-east-1a".into(), "--node-count=3".into()],
        };
        assert_eq!(
            command.args(),
            ["create", "cluster", "--zones=us-east-1a", "--node-count=3", "--name=prod"]
        );
    }

    #[test]
    fn test_instance_group_args() {
        let create = KopsCommand::CreateInstanceGroup {
            cluster: "prod".into(),
            name: "nodes".into(),
        };
        let edit = KopsCommand::EditInstanceGroup {
            cluster: "prod".into(),
            name: "nodes".into(),
        };
        assert_eq!(create.args(), ["create", "ig", "--name=prod", "nodes"]);
        assert_eq!(edit.args(), ["edit", "ig", "--name=prod", "nodes"]);
        assert!(create.is_quiet());
        assert!(!edit.is_quiet());
    }

    #[test]
    fn test_display() {
        let update = KopsCommand::UpdateCluster { name: "prod".into() };
        assert_eq!(update.to_string(), "kops update cluster --name=prod -v1 --yes");

        let delete = KopsCommand::DeleteCluster { name: "prod".into() };
        assert_eq!(delete.to_string(), "kops delete cluster --name=prod --yes");

        let edit = KopsCommand::EditCluster { name: "prod".into() };
        assert_eq!(edit.to_string(), "kops edit cluster --name=prod");
    }
}
