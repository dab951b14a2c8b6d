//! Language pack extraction and projection into the build output store.
//!
//! A module's `locale/` directory holds one entry per locale:
//!
//! ```text
//! <module>/locale/en-US.json             flat record
//! <module>/locale/es-MX/copy.json        directory record
//! <module>/locale/es-MX/links/integration.json
//! ```
//!
//! Each entry is projected to `<root>/static/modules/<module>/<locale>/<module>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::LocaleError;
use crate::actor::fs::is_temp_file;
use crate::core::Paths;
use crate::store::{BuildOutputStore, StoreError};

pub const LOCALE_DIR: &str = "locale";
pub const COPY_FILE: &str = "copy.json";
pub const LINKS_FILE: &str = "links/integration.json";

const LOCALE_SEPARATOR: &str = "/locale/";

/// Lower-case a locale entry name and drop everything from the first `.`.
///
/// `en-US.json` -> `en-us`, `es-MX` -> `es-mx`
pub fn normalize_locale(entry: &str) -> String {
    let stem = entry.split('.').next().unwrap_or(entry);
    stem.to_lowercase()
}

/// `(module_name, locale)` for a path inside a module's locale directory.
///
/// ```text
/// /work/sample-module/locale/en-US.json       -> ("sample-module", "en-us")
/// /work/sample-module/locale/es-MX/copy.json  -> ("sample-module", "es-mx")
/// ```
pub fn parse_path_info(path: &Path) -> Result<(String, String), LocaleError> {
    let malformed = || LocaleError::MalformedPath(path.to_path_buf());
    let text = path.to_string_lossy().replace('\\', "/");

    let mut parts = text.split(LOCALE_SEPARATOR);
    let (Some(module_part), Some(locale_part), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    let module_name = module_part.rsplit('/').next().unwrap_or_default();
    let locale = locale_part.split('/').next().unwrap_or_default();
    if module_name.is_empty() || locale.is_empty() {
        return Err(malformed());
    }

    Ok((module_name.to_string(), normalize_locale(locale)))
}

/// Module source root for a path inside its locale directory.
pub fn module_root(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|dir| dir.file_name().is_some_and(|name| name == LOCALE_DIR))
        .and_then(Path::parent)
        .map(Path::to_path_buf)
}

/// Read one locale entry.
///
/// - file: its parsed JSON
/// - directory: `copy.json` with `links` set to `links/integration.json` (or `{}`)
/// - anything else, including a missing path: `None`
pub fn extract_language_data(path: &Path) -> Result<Option<Value>, LocaleError> {
    if path.is_dir() {
        let copy = extract_language_data(&path.join(COPY_FILE))?;
        let links = extract_language_data(&path.join(LINKS_FILE))?
            .unwrap_or_else(|| Value::Object(Map::new()));

        let mut record = match copy {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        record.insert("links".to_string(), links);
        return Ok(Some(Value::Object(record)));
    }

    if path.is_file() {
        let bytes = fs::read(path).map_err(|e| LocaleError::Io(path.to_path_buf(), e))?;
        let value =
            serde_json::from_slice(&bytes).map_err(|e| LocaleError::Json(path.to_path_buf(), e))?;
        return Ok(Some(value));
    }

    Ok(None)
}

/// Every `(locale, record)` under `<module_path>/locale`, in entry name order.
///
/// Returns `None` when the module has no locale directory.
pub fn load_module_language_packs(
    module_path: &Path,
) -> Result<Option<Vec<(String, Value)>>, LocaleError> {
    let dir = module_path.join(LOCALE_DIR);
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut entries = fs::read_dir(&dir)
        .map_err(|e| LocaleError::Io(dir.clone(), e))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| !is_temp_file(path))
        .collect::<Vec<_>>();
    entries.sort();

    let mut packs = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(record) = extract_language_data(&entry)? {
            packs.push((normalize_locale(name), record));
        }
    }
    Ok(Some(packs))
}

/// Project every language pack of a module into the store.
///
/// Returns the locales written; empty when the module has no locale directory.
pub fn add_language_packs_for_module(
    store: &dyn BuildOutputStore,
    paths: &Paths,
    module_path: &Path,
    module_name: &str,
) -> Result<Vec<String>, LocaleError> {
    let Some(packs) = load_module_language_packs(module_path)? else {
        return Ok(Vec::new());
    };

    let mut locales = Vec::with_capacity(packs.len());
    for (locale, record) in packs {
        write_bundle(store, paths, module_name, &locale, &record)?;
        locales.push(locale);
    }
    Ok(locales)
}

/// Re-extract a single locale entry and rewrite its bundle.
///
/// `locale_entry` is `<module>/locale/<entry>`, a file or a directory.
/// An entry that no longer exists writes nothing.
pub fn add_module_language_pack(
    store: &dyn BuildOutputStore,
    paths: &Paths,
    locale_entry: &Path,
    module_name: &str,
    locale: &str,
) -> Result<(), LocaleError> {
    match extract_language_data(locale_entry)? {
        Some(record) => write_bundle(store, paths, module_name, &normalize_locale(locale), &record),
        None => Ok(()),
    }
}

/// Remove a locale bundle, then its directory if nothing else is left in it.
///
/// Deleting a directory locale yields one event per nested path; only the
/// first finds a bundle, so an already missing bundle is not an error.
pub fn remove_module_language_pack(
    store: &dyn BuildOutputStore,
    paths: &Paths,
    module_name: &str,
    locale: &str,
) -> Result<(), LocaleError> {
    let bundle = paths.locale_bundle_path(module_name, &normalize_locale(locale));
    match store.remove(&bundle) {
        Ok(()) | Err(StoreError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }
    if let Some(dir) = bundle.parent() {
        store.remove_dir_if_empty(dir);
    }
    Ok(())
}

fn write_bundle(
    store: &dyn BuildOutputStore,
    paths: &Paths,
    module_name: &str,
    locale: &str,
    record: &Value,
) -> Result<(), LocaleError> {
    let bundle = paths.locale_bundle_path(module_name, locale);
    let body = serde_json::to_vec(record).map_err(|e| LocaleError::Json(bundle.clone(), e))?;
    store.write(&bundle, body)?;
    Ok(())
}
