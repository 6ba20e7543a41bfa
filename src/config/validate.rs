// src/config/validate.rs

use globset::Glob;
use regex::Regex;

use crate::config::model::ReaderOptions;
use crate::errors::{PipewatchError, Result};

/// Validate reader options beyond what deserialization enforces.
pub fn validate_options(options: &ReaderOptions) -> Result<()> {
    ensure_collapse_origin(options)?;
    ensure_lock_budget(options)?;
    ensure_execution_pattern(options)?;
    ensure_log_glob(options)?;
    Ok(())
}

fn ensure_collapse_origin(options: &ReaderOptions) -> Result<()> {
    if options.collapse_origin.trim().is_empty() {
        return Err(PipewatchError::ConfigError(
            "collapse_origin must be a non-empty job path".to_string(),
        ));
    }
    Ok(())
}

fn ensure_lock_budget(options: &ReaderOptions) -> Result<()> {
    if options.lock_attempts == 0 {
        return Err(PipewatchError::ConfigError(
            "lock_attempts must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn ensure_execution_pattern(options: &ReaderOptions) -> Result<()> {
    let re = Regex::new(&options.execution_line_pattern).map_err(|e| {
        PipewatchError::ConfigError(format!(
            "execution_line_pattern is not a valid regex: {e}"
        ))
    })?;

    if re.captures_len() < 2 {
        return Err(PipewatchError::ConfigError(
            "execution_line_pattern must contain a capture group for the job path".to_string(),
        ));
    }
    Ok(())
}

fn ensure_log_glob(options: &ReaderOptions) -> Result<()> {
    Glob::new(&options.log_glob).map_err(|e| {
        PipewatchError::ConfigError(format!("log_glob is not a valid glob: {e}"))
    })?;
    Ok(())
}
