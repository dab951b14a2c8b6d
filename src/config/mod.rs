//! Sandbox configuration management for `sandbox.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── sandbox    # [sandbox]
//! │   ├── serve      # [serve]
//! │   ├── locale     # [locale]
//! │   ├── scenarios  # [scenarios]
//! │   └── modules    # [[modules]]
//! ├── error          # ConfigError
//! ├── util           # config file lookup, URL checks
//! └── mod.rs         # SandboxConfig (this file)
//! ```
//!
//! Loading order: find the file upward from the working directory, parse it
//! (collecting unknown keys), resolve every path against the project root,
//! apply CLI overrides, derive the watch lists, then validate.

mod error;
pub mod section;
mod util;

pub use error::ConfigError;
pub use section::{
    LocaleConfig, ModuleConfig, SandboxSectionConfig, ScenariosConfig, ServeConfig,
};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Commands};
use crate::core::Paths;
use crate::locale::LocaleOptions;
use crate::logger::{LogLevel, Logger};
use crate::module_map::ModuleDescriptor;
use crate::scenario::ScenarioOptions;
use crate::utils::path::normalize_path;
use util::find_config_file;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sandbox.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root: `[sandbox].context` resolved against the config file's directory
    #[serde(skip)]
    pub root: PathBuf,

    /// Keys present in the file that nothing reads
    #[serde(skip)]
    pub unknown_fields: Vec<String>,

    #[serde(default)]
    pub sandbox: SandboxSectionConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub locale: LocaleConfig,

    #[serde(default)]
    pub scenarios: ScenariosConfig,

    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

impl SandboxConfig {
    /// Load configuration for the given CLI invocation.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path =
            find_config_file(&cli.config).ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;

        let mut config = Self::from_path(&config_path)?;
        config.config_path = normalize_path(&config_path);
        config.finalize(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        config.unknown_fields = ignored;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub(crate) fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Warn about unknown fields once a logger exists.
    pub fn warn_unknown_fields(&self, logger: &Logger) {
        if self.unknown_fields.is_empty() {
            return;
        }
        let display_path = self
            .config_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.config_path.to_string_lossy());
        crate::warn!(
            logger, "config";
            "unknown fields in {}, ignoring: {}",
            display_path,
            self.unknown_fields.join(", ")
        );
    }

    /// Resolve paths, apply CLI overrides and derive watch lists.
    fn finalize(&mut self, cli: &Cli) {
        let config_dir = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        self.normalize_paths(&config_dir);
        self.apply_command_options(cli);

        self.locale.derive_from(&self.modules);
        self.scenarios.derive_from(&self.modules);
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve {
                interface,
                port,
                ws_port,
                verbose,
                quiet,
                no_locale,
                no_scenarios,
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.ws_port, ws_port.as_ref());

                if *verbose {
                    self.sandbox.log_level = LogLevel::Debug;
                } else if *quiet {
                    self.sandbox.log_level = LogLevel::Error;
                }
                if *no_locale {
                    self.locale.enable = false;
                }
                if *no_scenarios {
                    self.scenarios.enable = false;
                }
            }
            // Map command doesn't modify config
            Commands::Map { .. } => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize all paths relative to the project root.
    fn normalize_paths(&mut self, config_dir: &Path) {
        let root = normalize_path(&config_dir.join(&self.sandbox.context));
        self.sandbox.static_path = normalize_path(&root.join(&self.sandbox.static_path));

        for module in &mut self.modules {
            module.normalize(&root);
        }
        self.locale.normalize(&root);
        self.scenarios.normalize(&root);

        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Collect every problem and report them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        self.sandbox.validate(&mut errors);
        self.serve.validate(&mut errors);
        section::validate_modules(&self.modules, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")).into())
        }
    }

    // ========================================================================
    // accessors
    // ========================================================================

    pub fn paths(&self) -> Paths {
        Paths::new(&self.root)
    }

    pub fn log_level(&self) -> LogLevel {
        self.sandbox.log_level
    }

    pub fn module_descriptors(&self) -> Vec<ModuleDescriptor> {
        self.modules.iter().map(ModuleConfig::descriptor).collect()
    }

    pub fn locale_options(&self) -> LocaleOptions {
        LocaleOptions {
            enabled: self.locale.enable,
            module_paths: self.locale.modules.clone(),
        }
    }

    pub fn scenario_options(&self) -> ScenarioOptions {
        ScenarioOptions {
            enabled: self.scenarios.enable,
            files: self.scenarios.files.clone(),
        }
    }

    /// `http://<host>:<port>` as configured (before any port retry).
    pub fn server_address(&self) -> String {
        format!("http://{}:{}", self.serve.display_host(), self.serve.port)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config with the minimal required `[sandbox]` fields.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> SandboxConfig {
    let config = format!("[sandbox]\nroot_module = \"root\"\n{extra}");
    let (parsed, ignored) = SandboxConfig::parse_with_ignored(&config).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
