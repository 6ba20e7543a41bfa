// src/config/mod.rs

//! Configuration loading and validation for pipewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an options file from disk (`loader.rs`).
//! - Validate basic invariants like regex/glob wellformedness (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{MarkerNames, ReaderOptions};
pub use validate::validate_options;
