// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Options controlling how a [`crate::reader::PipelineReader`] interprets a
/// project directory, as read from a TOML file.
///
/// ```toml
/// locked_paths = ["default_pipeline"]
/// collapse_origin = "Import/job001"
/// lock_attempts = 5
/// lock_backoff_ms = 100
/// log_glob = "pipeline_*.log"
///
/// [markers]
/// success = "JOB_EXIT_SUCCESS"
/// ```
///
/// All fields are optional and have defaults matching the external tool's
/// conventions.
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderOptions {
    /// Descriptor paths (relative to the project root) that must only be
    /// read under the directory-lock convention.
    ///
    /// Descriptors not listed here are read without mutual exclusion; tests
    /// and one-shot inspection tools rely on that.
    #[serde(default)]
    pub locked_paths: Vec<PathBuf>,

    /// Job path the collapse traversal starts from, e.g. `"Import/job001"`.
    #[serde(default = "default_collapse_origin")]
    pub collapse_origin: String,

    /// Number of attempts to acquire the descriptor lock before degrading to
    /// an empty read.
    #[serde(default = "default_lock_attempts")]
    pub lock_attempts: u32,

    /// Sleep between lock attempts, in milliseconds.
    #[serde(default = "default_lock_backoff_ms")]
    pub lock_backoff_ms: u64,

    /// Exit-status marker file names written into each job directory.
    #[serde(default)]
    pub markers: MarkerNames,

    /// Glob (relative to the project root) matching execution log files.
    #[serde(default = "default_log_glob")]
    pub log_glob: String,

    /// Regex recognising an execution record line; capture group 1 is the
    /// job path. The timestamp sits on the immediately preceding line.
    #[serde(default = "default_execution_pattern")]
    pub execution_line_pattern: String,

    /// Stage-directory prefix under which per-class output files carry a
    /// class-number annotation.
    #[serde(default = "default_init_model_prefix")]
    pub init_model_prefix: String,
}

fn default_collapse_origin() -> String {
    "Import/job001".to_string()
}

fn default_lock_attempts() -> u32 {
    5
}

fn default_lock_backoff_ms() -> u64 {
    100
}

fn default_log_glob() -> String {
    "pipeline_*.log".to_string()
}

fn default_execution_pattern() -> String {
    r"executing new job.* (\S+)".to_string()
}

fn default_init_model_prefix() -> String {
    "InitialModel".to_string()
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            locked_paths: Vec::new(),
            collapse_origin: default_collapse_origin(),
            lock_attempts: default_lock_attempts(),
            lock_backoff_ms: default_lock_backoff_ms(),
            markers: MarkerNames::default(),
            log_glob: default_log_glob(),
            execution_line_pattern: default_execution_pattern(),
            init_model_prefix: default_init_model_prefix(),
        }
    }
}

/// Fixed, tool-defined marker file names, overridable for other tools.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkerNames {
    #[serde(default = "default_success_marker")]
    pub success: String,

    #[serde(default = "default_failure_marker")]
    pub failure: String,

    #[serde(default = "default_aborted_marker")]
    pub aborted: String,
}

fn default_success_marker() -> String {
    "JOB_EXIT_SUCCESS".to_string()
}

fn default_failure_marker() -> String {
    "JOB_EXIT_FAILURE".to_string()
}

fn default_aborted_marker() -> String {
    "JOB_EXIT_ABORTED".to_string()
}

impl Default for MarkerNames {
    fn default() -> Self {
        Self {
            success: default_success_marker(),
            failure: default_failure_marker(),
            aborted: default_aborted_marker(),
        }
    }
}
