//! Provisioner abstraction over kops.
//!
//! The [`Provisioner`] trait is the surface wk needs from kops. The real
//! implementation is [`kops::KopsBackend`]; tests substitute an in-process
//! fake that plays the role of kops, including calling the editor.

pub mod kops;

use crate::error::Result;
use crate::types::{Env, KopsCommand};

/// Drives the external cluster provisioning tool.
///
/// Every call blocks until the subprocess exits. `env` is added to the
/// inherited environment.
pub trait Provisioner: Send + Sync {
    /// Run one command to completion
    fn run(&self, command: &KopsCommand, env: &Env) -> Result<()>;

    fn create_cluster(&self, name: &str, flags: &[String], env: &Env) -> Result<()> {
        self.run(
            &KopsCommand::CreateCluster {
                name: name.to_string(),
                flags: flags.to_vec(),
            },
            env,
        )
    }

    fn edit_cluster(&self, name: &str, env: &Env) -> Result<()> {
        self.run(&KopsCommand::EditCluster { name: name.to_string() }, env)
    }

    fn create_instance_group(&self, cluster: &str, name: &str, env: &Env) -> Result<()> {
        self.run(
            &KopsCommand::CreateInstanceGroup {
                cluster: cluster.to_string(),
                name: name.to_string(),
            },
            env,
        )
    }

    fn edit_instance_group(&self, cluster: &str, name: &str, env: &Env) -> Result<()> {
        self.run(
            &KopsCommand::EditInstanceGroup {
                cluster: cluster.to_string(),
                name: name.to_string(),
            },
            env,
        )
    }

    fn update_cluster(&self, name: &str, env: &Env) -> Result<()> {
        self.run(&KopsCommand::UpdateCluster { name: name.to_string() }, env)
    }

    fn delete_cluster(&self, name: &str, env: &Env) -> Result<()> {
        self.run(&KopsCommand::DeleteCluster { name: name.to_string() }, env)
    }
}
