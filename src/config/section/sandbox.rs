//! `[sandbox]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [sandbox]
//! root_module = "frame-module"
//! remote_module_map = "https://example.com/cdn/module-map.json"
//! externals = ["https://example.com/polyfills.js"]
//! context = "."              # project root, relative to this file
//! static_path = "static"     # disk fallback for /static/** requests
//! proxy = "http://proxy.internal:3128"
//! log_level = "log"          # error | warn | log | debug
//! lang = "en-US"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::util::is_http_url;
use crate::logger::LogLevel;
use crate::render::DEFAULT_LANG;

/// Sandbox-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSectionConfig {
    /// Module rendered first in the development document.
    pub root_module: String,

    /// Deployed module map merged under the local modules.
    pub remote_module_map: Option<String>,

    /// Extra script URLs loaded after the vendor directory's scripts.
    pub externals: Vec<String>,

    /// Project root, relative to the config file.
    pub context: PathBuf,

    /// Directory served for `/static/**` when the store has no file.
    /// Relative to `context`.
    pub static_path: PathBuf,

    /// Outbound proxy for the remote module map and relayed assets.
    pub proxy: Option<String>,

    pub log_level: LogLevel,

    /// Document language; also selects the app's i18n bundle.
    pub lang: String,
}

impl Default for SandboxSectionConfig {
    fn default() -> Self {
        Self {
            root_module: String::new(),
            remote_module_map: None,
            externals: Vec::new(),
            context: PathBuf::from("."),
            static_path: PathBuf::from("static"),
            proxy: None,
            log_level: LogLevel::default(),
            lang: DEFAULT_LANG.to_string(),
        }
    }
}

impl SandboxSectionConfig {
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.root_module.trim().is_empty() {
            errors.push("[sandbox].root_module is required".into());
        }
        if let Some(url) = &self.remote_module_map
            && !is_http_url(url)
        {
            errors.push(format!(
                "[sandbox].remote_module_map is not an http(s) URL: `{url}`"
            ));
        }
        if let Some(proxy) = &self.proxy
            && !is_http_url(proxy)
        {
            errors.push(format!("[sandbox].proxy is not an http(s) URL: `{proxy}`"));
        }
        if self.lang.trim().is_empty() {
            errors.push("[sandbox].lang must not be empty".into());
        }
    }
}
