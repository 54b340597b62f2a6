//! Real kops CLI backend

use crate::backend::Provisioner;
use crate::error::{Error, Result};
use crate::types::{Env, KopsCommand};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

/// Backend that executes the `kops` binary
#[derive(Debug, Clone)]
pub struct KopsBackend {
    binary: PathBuf,
}

impl KopsBackend {
    /// Locate `kops` on PATH
    pub fn new() -> Result<Self> {
        let binary = which::which("kops").map_err(|_| Error::NotFound)?;
        Ok(Self { binary })
    }

    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    fn command(&self, command: &KopsCommand, env: &Env) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(command.args()).envs(env.iter().map(|(k, v)| (k, v)));
        cmd
    }

    /// Run with captured output, replayed through the logger.
    ///
    /// A successful quiet command carries the editor hook's diff for a newly
    /// created object and is replayed at info; a failure is replayed at debug.
    fn run_captured(&self, command: &KopsCommand, env: &Env) -> Result<()> {
        let output = self
            .command(command, env)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                command: command.to_string(),
                source,
            })?;

        let transcript = transcript(&output.stdout, &output.stderr);
        if !transcript.is_empty() {
            let level = if output.status.success() {
                log::Level::Info
            } else {
                log::Level::Debug
            };
            log::log!(level, "{command}:\n{transcript}");
        }
        check(command, output.status)
    }
}

impl Provisioner for KopsBackend {
    fn run(&self, command: &KopsCommand, env: &Env) -> Result<()> {
        log::debug!("Running {command}");

        if command.is_quiet() {
            return self.run_captured(command, env);
        }

        let status = self
            .command(command, env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| Error::Spawn {
                command: command.to_string(),
                source,
            })?;
        check(command, status)
    }
}

fn check(command: &KopsCommand, status: ExitStatus) -> Result<()> {
    if !status.success() {
        return Err(Error::CommandFailed {
            command: command.to_string(),
            status: status.to_string(),
        });
    }
    Ok(())
}

/// Captured stdout followed by stderr, blank streams dropped
fn transcript(stdout: &[u8], stderr: &[u8]) -> String {
    [stdout, stderr]
        .iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim_end().to_string())
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
