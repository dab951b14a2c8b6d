//! Embedded resources for the sandbox server.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server templates (document.html, hotreload.js)
//!
//! ```ignore
//! use embed::serve::{HOTRELOAD_JS, HotreloadVars};
//!
//! let js = HOTRELOAD_JS.render(&HotreloadVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Variables for hotreload.js.
    pub struct HotreloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for HotreloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__SANDBOX_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live reload client with WebSocket port injection.
    pub const HOTRELOAD_JS: Template<HotreloadVars> =
        Template::new(include_str!("serve/hotreload.js"));

    /// Variables for document.html. Every field is inserted verbatim.
    pub struct DocumentVars {
        pub lang: String,
        pub initial_state: String,
        pub scripts: String,
    }

    impl TemplateVars for DocumentVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__LANG__", &self.lang)
                .replace("__INITIAL_STATE__", &self.initial_state)
                .replace("__SCRIPTS__", &self.scripts)
        }
    }

    /// Development document shell.
    pub const DOCUMENT_HTML: Template<DocumentVars> =
        Template::new(include_str!("serve/document.html"));
}
