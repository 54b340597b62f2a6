//! Policy gate for rendered artifacts
//!
//! [`OpaPolicy`] evaluates a query with the `opa` CLI against every
//! document of an artifact. Depending on [`PolicyFailure`], an empty or a
//! non-empty result is reported as an issue.

use crate::error::{Error, Result};
use crate::types::Verdict;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Issue text for an empty or undefined result
pub const EMPTY_RESULT_ISSUE: &str = "policy query returned empty or undefined";

/// Accepts or rejects a rendered artifact
pub trait PolicyGate: Send + Sync {
    fn evaluate(&self, artifact: &Path) -> Result<Verdict>;
}

/// Which query results count as a failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PolicyFailure {
    /// Evaluate but never fail
    #[default]
    Off,
    /// Fail when the result is empty or undefined
    OnUndefined,
    /// Fail when the result is defined and non-empty
    OnDefined,
}

impl PolicyFailure {
    pub fn from_flags(fail_undefined: bool, fail_defined: bool) -> Result<Self> {
        match (fail_undefined, fail_defined) {
            (true, true) => Err(Error::ConflictingFailureModes),
            (true, false) => Ok(Self::OnUndefined),
            (false, true) => Ok(Self::OnDefined),
            (false, false) => Ok(Self::Off),
        }
    }
}

/// Policy gate backed by `opa eval`
#[derive(Debug, Clone)]
pub struct OpaPolicy {
    binary: PathBuf,
    query: String,
    data: Vec<PathBuf>,
    failure: PolicyFailure,
}

#[derive(Deserialize)]
struct EvalOutput {
    #[serde(default)]
    result: Vec<EvalResult>,
}

#[derive(Deserialize)]
struct EvalResult {
    #[serde(default)]
    expressions: Vec<Expression>,
}

#[derive(Deserialize)]
struct Expression {
    #[serde(default)]
    value: Value,
    text: String,
}

impl OpaPolicy {
    /// Locate `opa` on PATH
    pub fn new(query: &str, data: Vec<PathBuf>, failure: PolicyFailure) -> Result<Self> {
        let binary = which::which("opa").map_err(|_| Error::PolicyEngineNotFound)?;
        Ok(Self::with_binary(binary, query, data, failure))
    }

    pub fn with_binary(
        binary: PathBuf,
        query: &str,
        data: Vec<PathBuf>,
        failure: PolicyFailure,
    ) -> Self {
        Self {
            binary,
            query: query.to_string(),
            data,
            failure,
        }
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "eval".to_string(),
            "--format".to_string(),
            "json".to_string(),
            "--stdin-input".to_string(),
        ];
        for data in &self.data {
            args.push("-d".to_string());
            args.push(data.display().to_string());
        }
        args.push(self.query.clone());
        args
    }

    /// Evaluate the query with `input` as input; `None` when undefined
    fn query(&self, input: &Value) -> Result<Option<Value>> {
        let mut child = Command::new(&self.binary)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        if let Some(mut stdin) = child.stdin.take() {
            let bytes = serde_json::to_vec(input).map_err(Error::PolicyOutput)?;
            stdin
                .write_all(&bytes)
                .map_err(|source| self.spawn_error(source))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|source| self.spawn_error(source))?;
        if !output.status.success() {
            return Err(Error::PolicyFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let parsed: EvalOutput = serde_json::from_slice(&output.stdout).map_err(Error::PolicyOutput)?;
        find_expression(parsed, &self.query)
    }

    fn spawn_error(&self, source: std::io::Error) -> Error {
        Error::PolicySpawn {
            binary: self.binary.clone(),
            source,
        }
    }
}

impl PolicyGate for OpaPolicy {
    fn evaluate(&self, artifact: &Path) -> Result<Verdict> {
        let content = fs::read_to_string(artifact).map_err(|source| Error::Io {
            path: artifact.to_path_buf(),
            source,
        })?;

        let mut issues = Vec::new();
        for document in split_documents(&content) {
            let input: Value =
                serde_json::from_str(document).map_err(|source| Error::MalformedDocument {
                    path: artifact.to_path_buf(),
                    source,
                })?;
            let result = self.query(&input)?;
            if let Some(issue) = judge(result.as_ref(), self.failure) {
                issues.push(issue);
            }
        }

        log::trace!("{}: {} policy issues", artifact.display(), issues.len());
        Ok(Verdict::from_issues(issues))
    }
}

/// An undefined result yields no expressions at all
fn find_expression(output: EvalOutput, query: &str) -> Result<Option<Value>> {
    if output.result.is_empty() {
        return Ok(None);
    }
    output
        .result
        .into_iter()
        .flat_map(|r| r.expressions)
        .find(|e| e.text == query)
        .map(|e| Some(e.value))
        .ok_or_else(|| Error::QueryNotFound(query.to_string()))
}

/// Split a YAML stream of JSON documents
pub fn split_documents(content: &str) -> Vec<&str> {
    content
        .trim()
        .trim_matches('.')
        .split("---\n")
        .filter(|part| !part.trim().is_empty())
        .collect()
}

/// Turn one query result into an issue, if it is a failure under `failure`
pub fn judge(result: Option<&Value>, failure: PolicyFailure) -> Option<String> {
    let empty = match result {
        None | Some(Value::Null) => true,
        Some(Value::Array(values)) => values.is_empty(),
        Some(_) => false,
    };

    match failure {
        PolicyFailure::OnUndefined if empty => Some(EMPTY_RESULT_ISSUE.to_string()),
        PolicyFailure::OnDefined if !empty => result.map(|value| {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }),
        _ => None,
    }
}
