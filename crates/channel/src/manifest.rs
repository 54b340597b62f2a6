//! Addons manifest rendering
//!
//! ```yaml
//! kind: Addons
//! metadata:
//!   creationTimestamp: null
//!   name: addons
//! spec:
//!   addons:
//!   - manifest: dns/coredns.json
//!     name: dns-coredns-json
//!     version: 0.1.0
//!     id: 5e1f...
//! ```

use crate::error::Result;
use crate::types::ChannelItem;
use serde::Serialize;

/// File name of the manifest inside a channel output directory
pub const MANIFEST_FILE: &str = "channel.yaml";

/// Version stamped on every addon entry
pub const ADDON_VERSION: &str = "0.1.0";

#[derive(Serialize)]
struct Addons<'a> {
    kind: &'static str,
    metadata: Metadata<'a>,
    spec: Spec<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata<'a> {
    creation_timestamp: Option<&'a str>,
    name: &'a str,
}

#[derive(Serialize)]
struct Spec<'a> {
    addons: Vec<Addon<'a>>,
}

#[derive(Serialize)]
struct Addon<'a> {
    manifest: &'a str,
    name: String,
    version: &'static str,
    id: &'a str,
}

/// Addon name derived from a relative path
pub fn path_to_name(path: &str) -> String {
    path.replace(['/', '.'], "-").replace('_', "")
}

/// Render the manifest for `items`, in the order given
pub fn render_manifest(channel: &str, items: &[ChannelItem]) -> Result<String> {
    let addons = Addons {
        kind: "Addons",
        metadata: Metadata {
            creation_timestamp: None,
            name: channel,
        },
        spec: Spec {
            addons: items
                .iter()
                .map(|item| Addon {
                    manifest: &item.relative_path,
                    name: path_to_name(&item.relative_path),
                    version: ADDON_VERSION,
                    id: &item.hash,
                })
                .collect(),
        },
    };
    Ok(serde_yaml::to_string(&addons)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn item(path: &str, hash: &str) -> ChannelItem {
        ChannelItem {
            relative_path: path.to_string(),
            hash: hash.to_string(),
        }
    }

    #[test]
    fn test_path_to_name() {
        assert_eq!(path_to_name("dns/core_dns.json"), "dns-coredns-json");
        assert_eq!(path_to_name("a.json"), "a-json");
    }

    #[test]
    fn test_render_manifest() {
        let manifest = render_manifest(
            "addons",
            &[item("a.json", "aaaa"), item("sub/b_c.json", "bbbb")],
        )
        .unwrap();

        let parsed: Value = serde_yaml::from_str(&manifest).unwrap();
        assert_eq!(
            parsed,
            json!({
                "kind": "Addons",
                "metadata": {"creationTimestamp": null, "name": "addons"},
                "spec": {"addons": [
                    {"manifest": "a.json", "name": "a-json", "version": "0.1.0", "id": "aaaa"},
                    {"manifest": "sub/b_c.json", "name": "sub-bc-json", "version": "0.1.0", "id": "bbbb"}
                ]}
            })
        );
        assert!(manifest.starts_with("kind: Addons\n"));
    }

    #[test]
    fn test_render_empty_manifest() {
        let parsed: Value = serde_yaml::from_str(&render_manifest("addons", &[]).unwrap()).unwrap();
        assert_eq!(parsed["spec"]["addons"], json!([]));
    }
}
