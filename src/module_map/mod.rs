//! Module map construction.
//!
//! A module map tells the browser where each federated module's entry script
//! lives. Three maps exist at startup:
//!
//! - **remote**: fetched once from the deployment (may be empty)
//! - **local**: derived from the modules built on this machine
//! - **unified**: remote-only modules re-projected onto local static URLs,
//!   overlaid by the local map
//!
//! Remote modules in the unified map point at `/static/modules/<name>/<name>.browser.js`;
//! the proxy relay fetches those files from the real remote base on first request.

mod remote;

pub use remote::{REMOTE_MAP_TIMEOUT, http_client, load_remote_module_map};

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::paths::{combine_url_fragments, public_modules_url};
use crate::logger::Logger;

/// Bundle type used when re-projecting remote modules onto local URLs.
pub const BROWSER_BUNDLE: &str = "browser";

/// A module built from source on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: String,
    /// Source root (contains `locale/`, `mock/`, and the bundler output dir).
    pub path: PathBuf,
    /// Bundler output directory mirrored into the build output store.
    pub output: PathBuf,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            output: path.join("build"),
            path,
        }
    }
}

/// `{ "modules": { name: entry } }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMap {
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEntry {
    /// Ends with `/` for locally derived entries; optional in remote maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub browser: BrowserEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserEntry {
    pub url: String,
}

impl ModuleMap {
    pub fn get(&self, name: &str) -> Option<&ModuleEntry> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// The three maps produced at startup.
#[derive(Debug, Clone, Default)]
pub struct ModuleMaps {
    pub remote: ModuleMap,
    pub local: ModuleMap,
    pub unified: ModuleMap,
}

/// Map entry for `name` under the local URL scheme.
///
/// ```text
/// baseUrl = /static/modules/<name>/
/// url     = /static/modules/<name>/<name>[.<bundle_type>].js
/// ```
fn local_entry(name: &str, bundle_type: Option<&str>) -> ModuleEntry {
    let base = public_modules_url(&[name]);
    let file = match bundle_type {
        Some(bundle) => format!("{name}.{bundle}.js"),
        None => format!("{name}.js"),
    };

    ModuleEntry {
        browser: BrowserEntry {
            url: combine_url_fragments(&[&base, &file]),
        },
        base_url: Some(format!("{base}/")),
    }
}

pub fn create_local_module_map<'a, I>(names: I, bundle_type: Option<&str>) -> ModuleMap
where
    I: IntoIterator<Item = &'a str>,
{
    let modules = names
        .into_iter()
        .map(|name| (name.to_string(), local_entry(name, bundle_type)))
        .collect();
    ModuleMap { modules }
}

/// Remote-only modules re-projected with the `browser` bundle type, overlaid by `local`.
pub fn create_unified_module_map(local: &ModuleMap, remote: &ModuleMap) -> ModuleMap {
    let remote_only = remote
        .modules
        .keys()
        .filter(|name| !local.contains(name))
        .map(String::as_str);

    let mut unified = create_local_module_map(remote_only, Some(BROWSER_BUNDLE));
    unified.modules.extend(
        local
            .modules
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone())),
    );
    unified
}

/// Fetch the remote map and derive the local and unified maps.
pub async fn create_module_map(
    client: &reqwest::Client,
    modules: &[ModuleDescriptor],
    remote_url: Option<&str>,
    logger: &Logger,
) -> ModuleMaps {
    let remote = load_remote_module_map(client, remote_url, logger).await;
    let local = create_local_module_map(modules.iter().map(|m| m.name.as_str()), None);
    let unified = create_unified_module_map(&local, &remote);

    crate::debug!(logger, "map"; "local modules: [{}]",
        local.modules.keys().cloned().collect::<Vec<_>>().join(", "));
    crate::debug!(logger, "map"; "remote modules: {}", remote.modules.len());

    ModuleMaps {
        remote,
        local,
        unified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_entry(url: &str) -> ModuleEntry {
        ModuleEntry {
            base_url: None,
            browser: BrowserEntry {
                url: url.to_string(),
            },
        }
    }

    #[test]
    fn test_local_map_empty() {
        let map = create_local_module_map(std::iter::empty(), None);
        assert_eq!(map, ModuleMap::default());
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"modules":{}}"#);
    }

    #[test]
    fn test_local_map_entry() {
        let map = create_local_module_map(["root-module"], None);
        let entry = map.get("root-module").unwrap();

        assert_eq!(entry.base_url.as_deref(), Some("/static/modules/root-module/"));
        assert_eq!(entry.browser.url, "/static/modules/root-module/root-module.js");
    }

    #[test]
    fn test_local_map_bundle_type() {
        let map = create_local_module_map(["child"], Some(BROWSER_BUNDLE));
        assert_eq!(
            map.get("child").unwrap().browser.url,
            "/static/modules/child/child.browser.js"
        );
    }

    #[test]
    fn test_unified_disjoint_keeps_both() {
        let local = create_local_module_map(["root-module"], None);
        let mut remote = ModuleMap::default();
        remote.modules.insert(
            "child-module".into(),
            remote_entry("https://example.com/modules/child-module/child-module.js"),
        );

        let unified = create_unified_module_map(&local, &remote);

        assert_eq!(unified.modules.len(), 2);
        let child = unified.get("child-module").unwrap();
        assert_eq!(child.base_url.as_deref(), Some("/static/modules/child-module/"));
        assert!(child.browser.url.ends_with("child-module.browser.js"));
        assert_eq!(unified.get("root-module"), local.get("root-module"));
    }

    #[test]
    fn test_unified_local_wins() {
        let local = create_local_module_map(["shared"], None);
        let mut remote = ModuleMap::default();
        remote.modules.insert(
            "shared".into(),
            remote_entry("https://cdn.example.com/shared/1.0.0/shared.browser.js"),
        );

        let unified = create_unified_module_map(&local, &remote);

        assert_eq!(unified.modules.len(), 1);
        assert_eq!(unified.get("shared"), local.get("shared"));
    }

    #[test]
    fn test_entry_invariants() {
        let local = create_local_module_map(["a", "b"], None);
        let mut remote = ModuleMap::default();
        remote.modules.insert("c".into(), remote_entry("https://x/c.browser.js"));

        for entry in create_unified_module_map(&local, &remote).modules.values() {
            assert!(entry.base_url.as_deref().unwrap().ends_with('/'));
            assert!(entry.browser.url.starts_with('/'));
            assert!(entry.browser.url.ends_with(".js"));
        }
    }

    #[test]
    fn test_remote_map_parses_optional_base_url() {
        let json = r#"{"modules":{"a":{"baseUrl":"https://cdn/a/1.0.0/","browser":{"url":"https://cdn/a/1.0.0/a.browser.js","integrity":"sha"}},"b":{"browser":{"url":"https://cdn/b.browser.js"}}}}"#;
        let map: ModuleMap = serde_json::from_str(json).unwrap();

        assert_eq!(map.get("a").unwrap().base_url.as_deref(), Some("https://cdn/a/1.0.0/"));
        assert!(map.get("b").unwrap().base_url.is_none());
    }

    #[test]
    fn test_descriptor_default_output() {
        let module = ModuleDescriptor::new("a", "/work/a");
        assert_eq!(module.output, PathBuf::from("/work/a/build"));
    }
}
