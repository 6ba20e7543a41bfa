// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::ReaderOptions;
use crate::config::validate::validate_options;
use crate::errors::Result;

/// Load reader options from a given path without semantic validation.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// recommended entry point.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ReaderOptions> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let options: ReaderOptions = toml::from_str(&contents)?;

    Ok(options)
}

/// Load reader options from path and run basic validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks that the collapse origin is non-empty, the retry budget is at
///   least one, the execution regex compiles with a capture group, and the
///   log glob is well-formed.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ReaderOptions> {
    let options = load_from_path(&path)?;
    validate_options(&options)?;
    Ok(options)
}

/// Helper to resolve a default options path.
///
/// Currently this just returns `Pipewatch.toml` in the current working
/// directory; embedding applications can layer their own discovery on top.
pub fn default_options_path() -> PathBuf {
    PathBuf::from("Pipewatch.toml")
}
