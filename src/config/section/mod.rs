//! Configuration section definitions.
//!
//! Each module corresponds to a section in `sandbox.toml`:
//!
//! | Module      | TOML Section   | Purpose                                  |
//! |-------------|----------------|------------------------------------------|
//! | `sandbox`   | `[sandbox]`    | Root module, remote map, static paths    |
//! | `serve`     | `[serve]`      | HTTP and live reload listeners           |
//! | `locale`    | `[locale]`     | Language pack watching                   |
//! | `scenarios` | `[scenarios]`  | Mock scenario watching                   |
//! | `modules`   | `[[modules]]`  | Locally built modules                    |

mod locale;
mod modules;
mod sandbox;
mod scenarios;
mod serve;

pub use locale::LocaleConfig;
pub use modules::{ModuleConfig, validate_modules};
pub use sandbox::SandboxSectionConfig;
pub use scenarios::ScenariosConfig;
pub use serve::ServeConfig;
