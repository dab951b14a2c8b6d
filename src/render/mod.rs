//! Development document rendering.
//!
//! Every `GET` that nothing else answers gets the same HTML shell: the
//! initial-state script carrying the module map, then the app scripts, the
//! vendor scripts, the module entry points (root module first) and the app
//! entry.

use std::sync::Arc;

use serde_json::json;

use crate::core::Paths;
use crate::core::paths::{public_app_url, public_externals_url, public_modules_url};
use crate::embed::serve::{DOCUMENT_HTML, DocumentVars};
use crate::logger::Logger;
use crate::module_map::ModuleMap;
use crate::store::BuildOutputStore;

/// Default document language.
pub const DEFAULT_LANG: &str = "en-US";

/// Bundle type the browser loads module entries with.
const BUNDLE_TYPE: &str = "browser";

/// Where the client posts runtime errors.
pub const ERROR_REPORTING_URL: &str = "/error";

/// A module entry point script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleScript {
    pub name: String,
    pub src: String,
}

pub struct DocumentRenderer {
    pub root_module_name: String,
    /// Unified module map.
    pub module_map: Arc<ModuleMap>,
    /// Locally built modules, in configuration order.
    pub local_modules: Vec<String>,
    /// Extra external scripts appended after the vendor directory's files.
    pub externals: Vec<String>,
    pub lang: String,
    pub store: Arc<dyn BuildOutputStore>,
    pub paths: Paths,
    pub logger: Logger,
}

impl DocumentRenderer {
    pub fn render(&self) -> String {
        let modules = self.module_scripts();
        crate::debug!(
            self.logger, "serve";
            "Rendered HTML with local modules: [{}]",
            modules.iter().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", ")
        );

        let mut sources = vec![
            public_app_url(&["app~vendors.js"]),
            public_app_url(&["runtime.js"]),
            public_app_url(&["vendors.js"]),
            public_app_url(&["i18n", &format!("{}.js", self.lang.to_lowercase())]),
        ];
        sources.extend(self.external_scripts());
        sources.extend(modules.into_iter().map(|m| m.src));
        sources.push(public_app_url(&["app.js"]));

        let scripts = sources
            .iter()
            .map(|src| format!(r#"<script src="{}"></script>"#, escape_attr(src)))
            .collect::<Vec<_>>()
            .join("\n");

        DOCUMENT_HTML.render(&DocumentVars {
            lang: self.lang.clone(),
            initial_state: self.initial_state_script(),
            scripts,
        })
    }

    /// Module entries with a built bundle, root module first.
    ///
    /// A root module that is not built locally is loaded from the module map;
    /// if it is not there either it is logged and left out.
    pub fn module_scripts(&self) -> Vec<ModuleScript> {
        let mut modules: Vec<ModuleScript> = self
            .local_modules
            .iter()
            .filter(|name| {
                let entry = self
                    .paths
                    .modules_path(&[name.as_str(), &format!("{name}.js")]);
                self.store.exists(&entry)
            })
            .map(|name| ModuleScript {
                name: name.clone(),
                src: public_modules_url(&[name.as_str(), &format!("{name}.js")]),
            })
            .collect();

        if !modules.iter().any(|m| m.name == self.root_module_name) {
            match self.module_map.get(&self.root_module_name) {
                Some(entry) => modules.push(ModuleScript {
                    name: self.root_module_name.clone(),
                    src: entry.browser.url.clone(),
                }),
                None => crate::error!(self.logger, "serve"; "Root Module not found"),
            }
        }

        // stable: keeps configuration order for the rest
        modules.sort_by_key(|m| m.name != self.root_module_name);
        modules
    }

    /// `.js` files in the vendors directory, then configured externals.
    fn external_scripts(&self) -> Vec<String> {
        let mut files: Vec<String> = std::fs::read_dir(self.paths.vendors_path(&[]))
            .map(|dir| {
                dir.filter_map(Result::ok)
                    .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
                    .filter(|name| name.ends_with(".js"))
                    .collect()
            })
            .unwrap_or_default();
        files.sort();

        files
            .iter()
            .map(|name| public_externals_url(&[name]))
            .chain(self.externals.iter().cloned())
            .collect()
    }

    fn initial_state_script(&self) -> String {
        let state = json!({
            "config": {
                "cdnUrl": public_modules_url(&[]),
                "rootModuleName": self.root_module_name,
                "reportingUrl": ERROR_REPORTING_URL,
            },
            "intl": {
                "activeLocale": self.lang,
            },
        })
        .to_string();

        let module_map = serde_json::to_string(self.module_map.as_ref()).unwrap_or_else(|_| "{}".into());
        let state = serde_json::to_string(&state).unwrap_or_else(|_| "\"{}\"".into());

        let lines = [
            "window.__render_mode__ = 'render';".to_string(),
            format!("window.__webpack_public_path__ = '{}';", public_app_url(&[])),
            format!("window.__holocron_module_bundle_type__ = '{BUNDLE_TYPE}';"),
            "window.__pwa_metadata__ = { serviceWorker: false };".to_string(),
            format!("window.__CLIENT_HOLOCRON_MODULE_MAP__ = {module_map};"),
            format!("window.__INITIAL_STATE__ = {state};"),
        ];
        escape_script(&lines.join("\n"))
    }
}

/// Keep inline JSON from closing the surrounding `<script>`.
fn escape_script(source: &str) -> String {
    source.replace("</", "<\\/")
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
