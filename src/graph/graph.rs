// src/graph/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::errors::{PipewatchError, Result};
use crate::graph::env::EnvValue;
use crate::graph::node::Node;
use crate::types::NodePath;

/// An ordered collection of [`Node`]s: a `Vec` arena plus a path index.
///
/// Insertion order is significant and drives deterministic traversal output.
/// Predecessor lists on the nodes are weak back-references (paths into this
/// arena) maintained here; the invariant is that every edge endpoint names a
/// node present in the same graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<NodePath, usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.path())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Position of the node at `path` in insertion order.
    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.index.get(path).copied()
    }

    pub fn node(&self, path: &str) -> Option<&Node> {
        self.index.get(path).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, path: &str) -> Option<&mut Node> {
        let idx = self.index.get(path).copied()?;
        Some(&mut self.nodes[idx])
    }

    /// Insert a node, wiring back-references for any edges that already name
    /// it or that it carries.
    pub fn insert(&mut self, node: Node) -> Result<()> {
        let path = node.path().to_string();
        if self.contains(&path) {
            return Err(PipewatchError::DuplicateNode(path));
        }

        let succs: Vec<NodePath> = node.successors().map(str::to_string).collect();
        let preds: Vec<NodePath> = self
            .nodes
            .iter()
            .filter(|n| n.has_edge_to(&path))
            .map(|n| n.path().to_string())
            .collect();

        self.push_node(node);

        for s in &succs {
            if let Some(idx) = self.index.get(s).copied() {
                self.nodes[idx].add_inbound(&path);
            }
        }
        if let Some(idx) = self.index.get(&path).copied() {
            for p in &preds {
                self.nodes[idx].add_inbound(p);
            }
        }
        Ok(())
    }

    /// Add a directed edge `from -> to`, idempotently.
    ///
    /// Both endpoints must already be present. Returns whether a new edge was
    /// appended.
    pub fn link(
        &mut self,
        from: &str,
        to: &str,
        traffic: BTreeMap<String, EnvValue>,
        share: Option<Vec<String>>,
    ) -> Result<bool> {
        if !self.contains(to) {
            return Err(PipewatchError::NodeNotFound(to.to_string()));
        }
        let from_idx = self
            .index
            .get(from)
            .copied()
            .ok_or_else(|| PipewatchError::NodeNotFound(from.to_string()))?;

        let added = self.nodes[from_idx].link_to(to, traffic, share);
        if added {
            if let Some(to_idx) = self.index.get(to).copied() {
                self.nodes[to_idx].add_inbound(from);
            }
        }
        Ok(added)
    }

    /// Remove the edge `from -> to` if present; no error when the edge is
    /// absent.
    pub fn unlink(&mut self, from: &str, to: &str) -> Result<()> {
        let from_idx = self
            .index
            .get(from)
            .copied()
            .ok_or_else(|| PipewatchError::NodeNotFound(from.to_string()))?;
        let removed = self.nodes[from_idx].unlink_from(to);
        if removed {
            if let Some(to_idx) = self.index.get(to).copied() {
                self.nodes[to_idx].remove_inbound(from);
            }
        }
        Ok(())
    }

    /// Recursive reachability over outgoing edges.
    ///
    /// A node is not its own ancestor unless it is reachable from itself
    /// through a cycle of length >= 1.
    pub fn is_ancestor_of(&self, ancestor: &str, candidate: &str) -> Result<bool> {
        let start = self
            .node(ancestor)
            .ok_or_else(|| PipewatchError::NodeNotFound(ancestor.to_string()))?;
        if !self.contains(candidate) {
            return Err(PipewatchError::NodeNotFound(candidate.to_string()));
        }

        let mut stack: Vec<&str> = start.successors().collect();
        let mut visited: HashSet<&str> = HashSet::new();
        while let Some(path) = stack.pop() {
            if path == candidate {
                return Ok(true);
            }
            if !visited.insert(path) {
                continue;
            }
            if let Some(node) = self.node(path) {
                stack.extend(node.successors());
            }
        }
        Ok(false)
    }

    /// All nodes with an empty predecessor list, in insertion order.
    pub fn find_origins(&self) -> Vec<NodePath> {
        self.nodes
            .iter()
            .filter(|n| n.predecessors().is_empty())
            .map(|n| n.path().to_string())
            .collect()
    }

    /// Deterministic preorder depth-first reachability from `origin`.
    ///
    /// Outgoing edges are followed in their stored order. An unknown origin
    /// is an immediate error, never coerced.
    pub fn explore(&self, origin: &str) -> Result<Vec<NodePath>> {
        if !self.contains(origin) {
            return Err(PipewatchError::NodeNotFound(origin.to_string()));
        }

        let mut visited: HashSet<NodePath> = HashSet::new();
        let mut order: Vec<NodePath> = Vec::new();
        let mut stack: Vec<NodePath> = vec![origin.to_string()];

        while let Some(path) = stack.pop() {
            if !visited.insert(path.clone()) {
                continue;
            }
            if let Some(node) = self.node(&path) {
                for edge in node.outgoing().iter().rev() {
                    if !visited.contains(&edge.to) {
                        stack.push(edge.to.clone());
                    }
                }
            }
            order.push(path);
        }
        Ok(order)
    }

    /// Partition into weakly-connected sub-graphs.
    ///
    /// Two-phase explore-then-reconcile: explore from every origin, then from
    /// any node not yet covered (so components that are pure cycles are not
    /// lost), and finally merge candidate components that share a node until
    /// no pair overlaps. The result does not depend on which node each scan
    /// started from.
    pub fn split_connected(&self) -> Vec<Graph> {
        let mut components: Vec<BTreeSet<NodePath>> = Vec::new();

        for origin in self.find_origins() {
            if let Ok(reach) = self.explore(&origin) {
                components.push(reach.into_iter().collect());
            }
        }

        for node in self.iter() {
            let covered = components.iter().any(|c| c.contains(node.path()));
            if !covered {
                if let Ok(reach) = self.explore(node.path()) {
                    components.push(reach.into_iter().collect());
                }
            }
        }

        // Reconcile: exploring from origins alone would incorrectly split a
        // graph whose unrelated origins converge on a shared downstream node.
        loop {
            let mut merged_any = false;
            'scan: for i in 0..components.len() {
                for j in (i + 1)..components.len() {
                    if !components[i].is_disjoint(&components[j]) {
                        let absorbed = components.remove(j);
                        components[i].extend(absorbed);
                        merged_any = true;
                        break 'scan;
                    }
                }
            }
            if !merged_any {
                break;
            }
        }

        debug!(
            components = components.len(),
            nodes = self.len(),
            "split graph into weakly-connected components"
        );

        components.iter().map(|set| self.subgraph(set)).collect()
    }

    /// Absorb `other` if the two graphs share at least one node (by path).
    ///
    /// Shared nodes get the union of both sides' outgoing edges; an edge
    /// present in either side is never lost. Returns whether a merge
    /// occurred.
    pub fn merge(&mut self, other: &Graph) -> bool {
        let shared = other.iter().any(|n| self.contains(n.path()));
        if !shared {
            return false;
        }

        for node in other.iter() {
            match self.index.get(node.path()).copied() {
                Some(idx) => {
                    for edge in node.outgoing() {
                        self.nodes[idx].push_edge(edge.clone());
                    }
                }
                None => {
                    let mut clone = node.clone();
                    clone.clear_inbound();
                    self.push_node(clone);
                }
            }
        }

        self.rebuild_back_refs();
        true
    }

    /// Remove the node at `path`, contracting its edges: every direct
    /// predecessor gains a direct edge to every direct successor, so
    /// downstream traversal is unaffected. The removed node's pending
    /// propagate values move onto the successors' pending stores, subject to
    /// the outgoing edges' share lists, so they keep travelling hop by hop.
    ///
    /// With `advance_edges`, the pending values are additionally applied
    /// straight to the successors' environments (one hop early); used for
    /// batch-split file nodes only.
    pub fn remove_node(&mut self, path: &str, advance_edges: bool) -> Result<()> {
        let idx = self
            .index
            .get(path)
            .copied()
            .ok_or_else(|| PipewatchError::NodeNotFound(path.to_string()))?;
        let node = self.nodes[idx].clone();

        // Self-loops do not survive contraction.
        let preds: Vec<NodePath> = node
            .predecessors()
            .iter()
            .filter(|p| p.as_str() != path)
            .cloned()
            .collect();
        let succs: Vec<NodePath> = node
            .successors()
            .filter(|s| *s != path)
            .map(str::to_string)
            .collect();

        for p in &preds {
            if let Some(i) = self.index.get(p).copied() {
                self.nodes[i].unlink_from(path);
            }
        }
        for s in &succs {
            if let Some(i) = self.index.get(s).copied() {
                self.nodes[i].remove_inbound(path);
            }
        }

        for p in &preds {
            for s in &succs {
                self.link(p, s, BTreeMap::new(), None)?;
            }
        }

        for edge in node.outgoing() {
            if edge.to == path {
                continue;
            }
            if let Some(i) = self.index.get(&edge.to).copied() {
                for (key, value) in node.env.pending() {
                    if !edge.shares(key) {
                        continue;
                    }
                    self.nodes[i].env.stage(key, value.clone());
                    if advance_edges {
                        self.nodes[i].env.set(key, value.clone());
                    }
                }
            }
        }

        self.nodes.remove(idx);
        self.reindex();
        Ok(())
    }

    /// Append without invariant maintenance; callers rebuild or wire
    /// back-references themselves.
    fn push_node(&mut self, node: Node) {
        self.index.insert(node.path().to_string(), self.nodes.len());
        self.nodes.push(node);
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.path().to_string(), i))
            .collect();
    }

    fn rebuild_back_refs(&mut self) {
        let pairs: Vec<(NodePath, NodePath)> = self
            .nodes
            .iter()
            .flat_map(|n| {
                let from = n.path().to_string();
                n.successors()
                    .map(move |s| (from.clone(), s.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();

        for node in &mut self.nodes {
            node.clear_inbound();
        }
        for (from, to) in pairs {
            if let Some(idx) = self.index.get(&to).copied() {
                self.nodes[idx].add_inbound(&from);
            }
        }
    }

    /// Copy of the nodes in `keep`, preserving this graph's insertion order
    /// and pruning edges that leave the set.
    fn subgraph(&self, keep: &BTreeSet<NodePath>) -> Graph {
        let mut sub = Graph::new();
        for node in self.iter() {
            if keep.contains(node.path()) {
                let mut clone = node.clone();
                clone.retain_edges(|e| keep.contains(&e.to));
                clone.clear_inbound();
                sub.push_node(clone);
            }
        }
        sub.rebuild_back_refs();
        sub
    }
}
