//! Channel types

use crate::error::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use template::ChannelSpec;

/// Files picked up from a channel folder when no filter is configured
pub const DEFAULT_FILTER: &str = r"\.jsonnet$";

/// A channel resolved against the workspace context directory
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    /// Absolute folder of templates
    pub folder: PathBuf,
    pub filter: Regex,
}

impl Channel {
    /// Resolve a channel definition.
    ///
    /// Returns `None` for channels without a folder, which have nothing to
    /// expand.
    pub fn from_spec(spec: &ChannelSpec, context_dir: &Path) -> Result<Option<Self>> {
        if spec.folder.is_empty() {
            return Ok(None);
        }

        let pattern = spec
            .file_whitelist_regexp
            .as_deref()
            .unwrap_or(DEFAULT_FILTER);
        let filter = Regex::new(pattern).map_err(|source| Error::InvalidFilter {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Some(Self {
            name: spec.name.clone(),
            folder: context_dir.join(&spec.folder),
            filter,
        }))
    }
}

/// One expanded, non-empty file of a channel
///
/// Ordered by relative path first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChannelItem {
    /// Path under the channel folder, with `.jsonnet` rewritten to `.json`
    pub relative_path: String,
    /// Hex content hash of the rendered bytes
    pub hash: String,
}

/// Result of a policy evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub issues: Vec<String>,
}

impl Verdict {
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            accepted: issues.is_empty(),
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(folder: &str, filter: Option<&str>) -> ChannelSpec {
        ChannelSpec {
            name: "addons".to_string(),
            path: "s3://bucket/prod/addons".to_string(),
            folder: folder.to_string(),
            file_whitelist_regexp: filter.map(str::to_string),
        }
    }

    #[test]
    fn test_from_spec_resolves_folder() {
        let channel = Channel::from_spec(&spec("addons", None), Path::new("/ws"))
            .unwrap()
            .unwrap();
        assert_eq!(channel.folder, Path::new("/ws/addons"));
        assert!(channel.filter.is_match("/ws/addons/dns.jsonnet"));
        assert!(!channel.filter.is_match("/ws/addons/dns.libsonnet"));
    }

    #[test]
    fn test_from_spec_without_folder() {
        assert!(Channel::from_spec(&spec("", None), Path::new("/ws")).unwrap().is_none());
    }

    #[test]
    fn test_custom_filter() {
        let channel = Channel::from_spec(&spec("addons", Some(r"prod-.*\.jsonnet$")), Path::new("/ws"))
            .unwrap()
            .unwrap();
        assert!(channel.filter.is_match("prod-dns.jsonnet"));
        assert!(!channel.filter.is_match("dns.jsonnet"));
    }

    #[test]
    fn test_invalid_filter() {
        let err = Channel::from_spec(&spec("addons", Some("(")), Path::new("/ws")).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { .. }));
    }

    #[test]
    fn test_items_sort_by_path() {
        let mut items = vec![
            ChannelItem { relative_path: "b.json".into(), hash: "1".into() },
            ChannelItem { relative_path: "a/z.json".into(), hash: "2".into() },
            ChannelItem { relative_path: "a.json".into(), hash: "3".into() },
        ];
        items.sort();
        let paths: Vec<&str> = items.iter().map(|i| i.relative_path.as_str()).collect();
        assert_eq!(paths, ["a.json", "a/z.json", "b.json"]);
    }
}
