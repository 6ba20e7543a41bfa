// src/graph/mod.rs

//! Dependency-graph representation for pipeline stages and artifacts.
//!
//! - [`node`] holds the vertex type: identity path, outgoing edges and the
//!   per-node key/value [`env::Environment`].
//! - [`env`] is the typed environment with its pending propagate store.
//! - [`graph`] is the arena-of-nodes container with origin discovery,
//!   connected-component splitting, merging and edge-contracting removal.

pub mod env;
pub mod graph;
pub mod node;

pub use env::{EnvValue, Environment};
pub use graph::Graph;
pub use node::{Edge, Node};
