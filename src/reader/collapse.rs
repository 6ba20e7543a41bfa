// src/reader/collapse.rs

//! Collapsing the full file+job graph into a dependency-ordered sequence of
//! job-type nodes.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::errors::{PipewatchError, Result};
use crate::graph::env::{EnvValue, Environment, KEY_BATCH_NUMBER, KEY_JOB_STRING};
use crate::graph::{Edge, Graph};
use crate::types::{JobStatus, NodeKind, NodePath};

/// Aggregate view of one visited job instance, keyed by its job-type
/// directory.
///
/// Created fresh on every collapse pass and never mutated afterwards. The
/// same job-type directory may appear more than once across historical runs;
/// callers that want uniqueness by job-type fold by `job_type` themselves;
/// collapsing guarantees only a stable, dependency-respecting total order.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTypeNode {
    /// The logical stage directory, e.g. `"MotionCorr"`.
    pub job_type: String,
    /// The concrete instance path this entry was derived from, e.g.
    /// `"MotionCorr/job002"`.
    pub job_string: String,
    pub status: JobStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Repeat count across historical executions.
    pub job_count: u32,
    /// Snapshot of the instance environment after propagate flushing.
    pub environment: Environment,
}

/// Build the job-only graph and walk it from `origin`, producing one
/// [`JobTypeNode`] per visited job instance in dependency order.
///
/// Pure with respect to `full`: all work happens on a structural copy, so
/// repeated calls with an unchanged graph produce identical output.
pub(crate) fn collapse_to_job_types(full: &Graph, origin: &str) -> Result<Vec<JobTypeNode>> {
    let mut jobs = job_only_graph(full)?;

    // A transient empty read (lock miss, missing descriptor) collapses to an
    // empty sequence; a populated job graph without the origin is structural.
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let origin = origin.trim_end_matches('/');
    if !jobs.contains(origin) {
        return Err(PipewatchError::MissingCollapseOrigin(origin.to_string()));
    }

    let mut visited: HashSet<NodePath> = HashSet::new();
    let mut out: Vec<JobTypeNode> = Vec::new();
    let mut stack: Vec<NodePath> = vec![origin.to_string()];

    while let Some(path) = stack.pop() {
        if !visited.insert(path.clone()) {
            continue;
        }

        let (flushed, edges) = match jobs.node_mut(&path) {
            Some(node) => {
                let flushed = node.env.flush_pending();
                let edges: Vec<Edge> = node.outgoing().to_vec();
                (flushed, edges)
            }
            None => continue,
        };

        // Forward flushed propagate values onto successors' pending stores.
        for edge in &edges {
            for (key, value) in &flushed {
                if edge.shares(key) {
                    if let Some(target) = jobs.node_mut(&edge.to) {
                        target.env.stage(key, value.clone());
                    }
                }
            }
        }

        if let Some(node) = jobs.node(&path) {
            let mut environment = node.env.clone();
            environment.set(KEY_JOB_STRING, EnvValue::Text(path.clone()));
            out.push(JobTypeNode {
                job_type: job_type_of(&path),
                job_string: path.clone(),
                status: environment.status.unwrap_or_default(),
                start_time: environment.start_time,
                end_time: environment.end_time,
                job_count: environment.job_count.unwrap_or(0),
                environment,
            });
        }

        for edge in edges.iter().rev() {
            if !visited.contains(&edge.to) {
                stack.push(edge.to.clone());
            }
        }
    }

    debug!(instances = out.len(), origin, "collapsed pipeline to job types");
    Ok(out)
}

/// Structural copy of `full` with every file node contracted away.
///
/// Batch-split file nodes advance their pending propagate values straight
/// into their successors' environments so the batch number is visible one
/// hop early.
fn job_only_graph(full: &Graph) -> Result<Graph> {
    let mut jobs = full.clone();

    let file_nodes: Vec<(NodePath, bool)> = jobs
        .iter()
        .filter(|n| n.kind() == NodeKind::File)
        .map(|n| {
            (
                n.path().to_string(),
                n.env.has_pending(KEY_BATCH_NUMBER),
            )
        })
        .collect();

    for (path, advance) in file_nodes {
        jobs.remove_node(&path, advance)?;
    }
    Ok(jobs)
}

/// Parent (job-type) directory of a concrete instance path.
fn job_type_of(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((parent, _)) => parent.to_string(),
        None => path.to_string(),
    }
}
