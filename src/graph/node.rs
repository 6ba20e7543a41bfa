// src/graph/node.rs

use std::collections::BTreeMap;

use crate::graph::env::{EnvValue, Environment};
use crate::types::{NodeKind, NodePath};

/// A directed edge from its owning node to `to`, with an optional key/value
/// traffic payload and a propagate-share restriction.
///
/// Edges have no identity of their own; their lifetime is the owning node's
/// outgoing-edge list.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub to: NodePath,
    pub traffic: BTreeMap<String, EnvValue>,
    /// Keys of pending propagate values that may travel across this edge.
    /// `None` shares everything.
    pub share: Option<Vec<String>>,
}

impl Edge {
    pub fn new(to: impl Into<NodePath>) -> Self {
        Self {
            to: to.into(),
            traffic: BTreeMap::new(),
            share: None,
        }
    }

    /// Whether a propagate value under `key` may flow across this edge.
    pub fn shares(&self, key: &str) -> bool {
        match &self.share {
            None => true,
            Some(keys) => keys.iter().any(|k| k == key),
        }
    }
}

/// A graph vertex identified by a hierarchical path.
///
/// Two nodes are equal iff their paths are equal; edges play no part in
/// equality once nodes are deduplicated by path. `inbound` holds weak
/// back-references (paths into the owning graph's node table), maintained by
/// [`crate::graph::Graph`], not by the node itself.
#[derive(Debug, Clone)]
pub struct Node {
    path: NodePath,
    kind: NodeKind,
    out: Vec<Edge>,
    inbound: Vec<NodePath>,
    pub env: Environment,
}

impl Node {
    pub fn new(path: impl Into<NodePath>, kind: NodeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            out: Vec::new(),
            inbound: Vec::new(),
            env: Environment::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn outgoing(&self) -> &[Edge] {
        &self.out
    }

    /// Paths of direct successors, in edge order.
    pub fn successors(&self) -> impl Iterator<Item = &str> {
        self.out.iter().map(|e| e.to.as_str())
    }

    /// Paths of direct predecessors (back-references, graph-maintained).
    pub fn predecessors(&self) -> &[NodePath] {
        &self.inbound
    }

    pub fn has_edge_to(&self, to: &str) -> bool {
        self.out.iter().any(|e| e.to == to)
    }

    /// Append an outgoing edge unless one to the same target already exists.
    ///
    /// Returns `true` if a new edge was added. The edge carries the
    /// caller-supplied traffic table and share list unchanged.
    pub fn link_to(
        &mut self,
        to: impl Into<NodePath>,
        traffic: BTreeMap<String, EnvValue>,
        share: Option<Vec<String>>,
    ) -> bool {
        let to = to.into();
        if self.has_edge_to(&to) {
            return false;
        }
        self.out.push(Edge { to, traffic, share });
        true
    }

    /// Remove the outgoing edge to `to` if present. No error if absent.
    ///
    /// Returns `true` if an edge was removed.
    pub fn unlink_from(&mut self, to: &str) -> bool {
        let before = self.out.len();
        self.out.retain(|e| e.to != to);
        self.out.len() != before
    }

    pub(crate) fn push_edge(&mut self, edge: Edge) {
        if !self.has_edge_to(&edge.to) {
            self.out.push(edge);
        }
    }

    pub(crate) fn add_inbound(&mut self, from: &str) {
        if !self.inbound.iter().any(|p| p == from) {
            self.inbound.push(from.to_string());
        }
    }

    pub(crate) fn remove_inbound(&mut self, from: &str) {
        self.inbound.retain(|p| p != from);
    }

    pub(crate) fn clear_inbound(&mut self) {
        self.inbound.clear();
    }

    pub(crate) fn retain_edges(&mut self, keep: impl Fn(&Edge) -> bool) {
        self.out.retain(|e| keep(e));
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Node {}

impl PartialEq<str> for Node {
    fn eq(&self, other: &str) -> bool {
        self.path == other
    }
}

impl PartialEq<&str> for Node {
    fn eq(&self, other: &&str) -> bool {
        self.path == *other
    }
}
