// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipewatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Node not found in graph: {0}")]
    NodeNotFound(String),

    #[error("Node already present in graph: {0}")]
    DuplicateNode(String),

    #[error("Descriptor parse error in {path}: {message}")]
    DescriptorParse { path: String, message: String },

    #[error("Edge endpoint '{endpoint}' not present in descriptor node set ({path})")]
    UnknownEdgeEndpoint { endpoint: String, path: String },

    #[error("Collapse origin '{0}' not present in the job graph")]
    MissingCollapseOrigin(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipewatchError>;
