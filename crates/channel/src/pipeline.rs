//! Channel build pipeline
//!
//! Discovers templates under a channel folder, expands each one on a worker
//! pool, gates the output through an optional policy and assembles a sorted
//! manifest. Workers return values; nothing is shared between them. All
//! workers are joined before any result is inspected.

use crate::error::{Error, Result};
use crate::manifest::{MANIFEST_FILE, render_manifest};
use crate::policy::PolicyGate;
use crate::progress::ProgressCallback;
use crate::types::{Channel, ChannelItem};
use rayon::prelude::*;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use template::{Bindings, Expander};
use walkdir::WalkDir;

const TEMPLATE_SUFFIX: &str = ".jsonnet";
const RENDERED_SUFFIX: &str = ".json";

/// Options shared by every file of one channel build
#[derive(Clone, Copy)]
pub struct BuildOptions<'a> {
    /// Rendered cluster document bound as `cluster` in every template
    pub cluster_file: &'a Path,
    /// Where artifacts and the manifest are written; nothing is written when unset
    pub output_dir: Option<&'a Path>,
    /// Worker count; one per file when unset
    pub jobs: Option<usize>,
    pub policy: Option<&'a dyn PolicyGate>,
}

/// A successfully built channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutput {
    /// Items sorted by relative path
    pub items: Vec<ChannelItem>,
    pub manifest: String,
}

type FileResult = std::result::Result<Option<ChannelItem>, Vec<String>>;

/// Files under the channel folder matching its filter, in walk order.
///
/// Entries that cannot be read, including a missing folder, are logged and
/// skipped.
pub fn discover(channel: &Channel) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(&channel.folder).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Channel {}: skipping unreadable entry: {e}", channel.name);
                continue;
            }
        };
        if entry.file_type().is_file() && channel.filter.is_match(&entry.path().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }
    files
}

/// Path of `file` under `folder` with the template suffix rewritten
pub fn relative_path(folder: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(folder).unwrap_or(file);
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    match relative.strip_suffix(TEMPLATE_SUFFIX) {
        Some(stem) => format!("{stem}{RENDERED_SUFFIX}"),
        None => relative,
    }
}

/// Build one channel.
///
/// Any issue fails the whole channel; issues are logged before returning
/// [`Error::ChannelFailed`]. Artifacts already copied to the output
/// directory are left in place, but no manifest is written.
pub fn build_channel(
    channel: &Channel,
    expander: &dyn Expander,
    options: BuildOptions<'_>,
    progress: &dyn ProgressCallback,
) -> Result<ChannelOutput> {
    let files = discover(channel);
    log::debug!(
        "Channel {}: {} templates under {}",
        channel.name,
        files.len(),
        channel.folder.display()
    );
    progress.on_channel_start(&channel.name, files.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.unwrap_or(files.len()).max(1))
        .build()?;

    let results: Vec<FileResult> = pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                let result = build_file(channel, file, expander, options);
                progress.on_file_complete(file);
                result
            })
            .collect()
    });

    let mut items = Vec::new();
    let mut issues = Vec::new();
    for result in results {
        match result {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(file_issues) => issues.extend(file_issues),
        }
    }

    items.sort();
    for pair in items.windows(2) {
        if pair[0].relative_path == pair[1].relative_path {
            issues.push(format!("duplicate channel entry {}", pair[0].relative_path));
        }
    }

    if !issues.is_empty() {
        for issue in &issues {
            log::error!("{issue}");
        }
        progress.on_channel_complete(&channel.name, false);
        return Err(Error::ChannelFailed {
            name: channel.name.clone(),
            count: issues.len(),
        });
    }

    let manifest = render_manifest(&channel.name, &items)?;
    if let Some(dir) = options.output_dir {
        write_manifest(dir, &manifest)?;
    }

    progress.on_channel_complete(&channel.name, true);
    Ok(ChannelOutput { items, manifest })
}

fn build_file(
    channel: &Channel,
    file: &Path,
    expander: &dyn Expander,
    options: BuildOptions<'_>,
) -> FileResult {
    let tag = |e: &dyn Display| vec![format!("{}: {e}", file.display())];

    let rendered = expander
        .expand(file, &Bindings::app(options.cluster_file))
        .map_err(|e| tag(&e))?;
    if rendered.is_empty() {
        log::debug!("{} rendered nothing, skipping", file.display());
        return Ok(None);
    }

    if let Some(policy) = options.policy {
        let verdict = policy.evaluate(rendered.path()).map_err(|e| tag(&e))?;
        if !verdict.accepted {
            return Err(verdict
                .issues
                .iter()
                .map(|issue| format!("Issue with file {}: {issue}", file.display()))
                .collect());
        }
    }

    let relative = relative_path(&channel.folder, file);
    if let Some(dir) = options.output_dir {
        rendered.copy_to(&dir.join(&relative)).map_err(|e| tag(&e))?;
    }

    Ok(Some(ChannelItem {
        relative_path: relative,
        hash: blake3::hash(rendered.content()).to_hex().to_string(),
    }))
}

fn write_manifest(dir: &Path, manifest: &str) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Error::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(MANIFEST_FILE);
    fs::write(&path, manifest).map_err(|source| Error::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::types::{DEFAULT_FILTER, Verdict};
    use regex::Regex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use template::Rendered;

    /// Renders each template to the content registered for its file name
    struct MapExpander(HashMap<&'static str, &'static str>);

    impl Expander for MapExpander {
        fn expand(&self, template: &Path, bindings: &Bindings) -> template::Result<Rendered> {
            assert!(bindings.yaml_stream);
            let name = template.file_name().unwrap().to_str().unwrap();
            match self.0.get(name) {
                Some(content) => Rendered::from_content(content.as_bytes().to_vec()),
                None => Err(template::Error::ExpansionFailed {
                    template: template.to_path_buf(),
                    status: "exit status: 1".to_string(),
                }),
            }
        }
    }

    /// Rejects any artifact containing "forbidden"
    struct DenyForbidden;

    impl PolicyGate for DenyForbidden {
        fn evaluate(&self, artifact: &Path) -> Result<Verdict> {
            let content = fs::read_to_string(artifact).unwrap();
            let issues = if content.contains("forbidden") {
                vec!["forbidden field".to_string()]
            } else {
                Vec::new()
            };
            Ok(Verdict::from_issues(issues))
        }
    }

    #[derive(Default)]
    struct Counting {
        files: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl ProgressCallback for Counting {
        fn on_channel_start(&self, _name: &str, _files: usize) {}
        fn on_file_complete(&self, _path: &Path) {
            self.files.fetch_add(1, Ordering::SeqCst);
        }
        fn on_channel_complete(&self, _name: &str, succeeded: bool) {
            if succeeded {
                self.succeeded.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn workspace(files: &[&str]) -> (TempDir, Channel) {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("addons");
        for file in files {
            let path = folder.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "// template").unwrap();
        }
        let channel = Channel {
            name: "addons".to_string(),
            folder,
            filter: Regex::new(DEFAULT_FILTER).unwrap(),
        };
        (dir, channel)
    }

    fn expander(entries: &[(&'static str, &'static str)]) -> MapExpander {
        MapExpander(entries.iter().copied().collect())
    }

    fn options(cluster_file: &Path) -> BuildOptions<'_> {
        BuildOptions {
            cluster_file,
            output_dir: None,
            jobs: None,
            policy: None,
        }
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/ws/addons"), Path::new("/ws/addons/dns/core.jsonnet")),
            "dns/core.json"
        );
        assert_eq!(
            relative_path(Path::new("/ws/addons"), Path::new("/ws/addons/raw.yaml")),
            "raw.yaml"
        );
    }

    #[test]
    fn test_discover_applies_filter() {
        let (_dir, channel) = workspace(&["a.jsonnet", "lib.libsonnet", "README.md", "sub/b.jsonnet"]);
        let files = discover(&channel);
        let relative: Vec<String> = files.iter().map(|f| relative_path(&channel.folder, f)).collect();
        assert_eq!(relative, ["a.json", "sub/b.json"]);
    }

    #[test]
    fn test_empty_render_is_dropped() {
        let (dir, channel) = workspace(&["a.jsonnet", "b.jsonnet"]);
        let expander = expander(&[("a.jsonnet", "{\"kind\": \"Service\"}\n"), ("b.jsonnet", "  \n")]);
        let cluster = dir.path().join("cluster.json");

        let output = build_channel(&channel, &expander, options(&cluster), &NoProgress).unwrap();

        assert_eq!(output.items.len(), 1);
        assert_eq!(output.items[0].relative_path, "a.json");
        assert_eq!(
            output.items[0].hash,
            blake3::hash(b"{\"kind\": \"Service\"}\n").to_hex().to_string()
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let (dir, channel) = workspace(&["c.jsonnet", "a.jsonnet", "sub/b.jsonnet"]);
        let expander = expander(&[("a.jsonnet", "1"), ("b.jsonnet", "2"), ("c.jsonnet", "3")]);
        let cluster = dir.path().join("cluster.json");

        let parallel = build_channel(&channel, &expander, options(&cluster), &NoProgress).unwrap();
        let serial = build_channel(
            &channel,
            &expander,
            BuildOptions {
                jobs: Some(1),
                ..options(&cluster)
            },
            &NoProgress,
        )
        .unwrap();

        assert_eq!(parallel, serial);
        let paths: Vec<&str> = parallel.items.iter().map(|i| i.relative_path.as_str()).collect();
        assert_eq!(paths, ["a.json", "c.json", "sub/b.json"]);
    }

    #[test]
    fn test_failures_are_counted_after_join() {
        let (dir, channel) = workspace(&["a.jsonnet", "broken.jsonnet", "bad.jsonnet"]);
        let expander = expander(&[("a.jsonnet", "{}"), ("bad.jsonnet", "{\"forbidden\": true}")]);
        let cluster = dir.path().join("cluster.json");
        let progress = Counting::default();

        let err = build_channel(
            &channel,
            &expander,
            BuildOptions {
                policy: Some(&DenyForbidden),
                ..options(&cluster)
            },
            &progress,
        )
        .unwrap_err();

        assert!(matches!(err, Error::ChannelFailed { ref name, count: 2 } if name == "addons"));
        assert_eq!(err.to_string(), "2 errors encountered compiling channel addons");
        assert_eq!(progress.files.load(Ordering::SeqCst), 3);
        assert_eq!(progress.succeeded.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_output_dir_receives_artifacts_and_manifest() {
        let (dir, channel) = workspace(&["a.jsonnet", "sub/b_c.jsonnet"]);
        let expander = expander(&[("a.jsonnet", "{\"a\": 1}"), ("b_c.jsonnet", "{\"b\": 2}")]);
        let cluster = dir.path().join("cluster.json");
        let out = dir.path().join("out");

        let output = build_channel(
            &channel,
            &expander,
            BuildOptions {
                output_dir: Some(&out),
                ..options(&cluster)
            },
            &NoProgress,
        )
        .unwrap();

        assert_eq!(fs::read_to_string(out.join("a.json")).unwrap(), "{\"a\": 1}");
        assert_eq!(fs::read_to_string(out.join("sub/b_c.json")).unwrap(), "{\"b\": 2}");
        assert_eq!(fs::read_to_string(out.join(MANIFEST_FILE)).unwrap(), output.manifest);
        assert!(output.manifest.contains("name: sub-bc-json"));
    }

    #[test]
    fn test_failed_channel_writes_no_manifest() {
        let (dir, channel) = workspace(&["a.jsonnet", "broken.jsonnet"]);
        let expander = expander(&[("a.jsonnet", "{}")]);
        let cluster = dir.path().join("cluster.json");
        let out = dir.path().join("out");

        build_channel(
            &channel,
            &expander,
            BuildOptions {
                output_dir: Some(&out),
                ..options(&cluster)
            },
            &NoProgress,
        )
        .unwrap_err();

        assert!(!out.join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_empty_folder_builds_empty_manifest() {
        let (dir, channel) = workspace(&[]);
        fs::create_dir_all(&channel.folder).unwrap();
        let cluster = dir.path().join("cluster.json");

        let output = build_channel(&channel, &expander(&[]), options(&cluster), &NoProgress).unwrap();
        assert!(output.items.is_empty());
    }

    #[test]
    fn test_missing_folder_builds_empty_channel() {
        let (dir, channel) = workspace(&[]);
        assert!(!channel.folder.exists());
        let cluster = dir.path().join("cluster.json");

        assert!(discover(&channel).is_empty());
        let output = build_channel(&channel, &expander(&[]), options(&cluster), &NoProgress).unwrap();
        assert!(output.items.is_empty());
    }
}
