// src/reader/mod.rs

//! Reading an on-disk pipeline into a [`Graph`] and deriving per-job
//! annotations from side-channel files.
//!
//! - [`descriptor`] parses the external tool's block/column bookkeeping file.
//! - [`cache`] memoizes parsed descriptors by path + mtime.
//! - [`annotate`] injects the two load-time semantic annotations.
//! - [`status`] infers completion status from exit-status marker files.
//! - [`times`] infers start times and repeat counts from execution logs.
//! - [`collapse`] folds the instance-level graph into job-type order.

pub mod cache;
pub mod collapse;
pub mod descriptor;

mod annotate;
mod status;
mod times;

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::ReaderOptions;
use crate::errors::{PipewatchError, Result};
use crate::graph::{Graph, Node};
use crate::lock::DirectoryLock;
use crate::types::NodeKind;

use annotate::Annotator;
use cache::DocumentCache;
pub use collapse::JobTypeNode;
use descriptor::{
    Document, EDGE_FROM_COLUMN, EDGE_PROCESS_COLUMN, EDGE_TO_COLUMN, NODE_NAME_COLUMN,
    PROCESS_ALIAS_COLUMN, PROCESS_NAME_COLUMN,
};

/// Observes a project directory maintained by the external tool.
///
/// All methods are blocking, synchronous filesystem calls; the reader is
/// meant to be owned by one caller thread and re-invoked on a fixed cadence.
#[derive(Debug)]
pub struct PipelineReader {
    root: PathBuf,
    options: ReaderOptions,
    graph: Graph,
    cache: DocumentCache,
    execution_re: Regex,
    annotator: Annotator,
}

impl PipelineReader {
    pub fn new(root: impl Into<PathBuf>, options: ReaderOptions) -> Result<Self> {
        let execution_re = Regex::new(&options.execution_line_pattern).map_err(|e| {
            PipewatchError::ConfigError(format!(
                "execution_line_pattern is not a valid regex: {e}"
            ))
        })?;
        let annotator = Annotator::new(&options.init_model_prefix)?;

        Ok(Self {
            root: root.into(),
            options,
            graph: Graph::new(),
            cache: DocumentCache::new(),
            execution_re,
            annotator,
        })
    }

    /// The most recently loaded graph (empty before the first [`Self::load`]).
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Drop all cached parsed descriptors.
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    /// Parse the descriptor at `descriptor` (relative to the project root)
    /// into a fresh graph of file and job nodes.
    ///
    /// Transient conditions (missing descriptor, lock not acquired within
    /// the retry budget) degrade to an empty graph. Structural parse
    /// failures abort the whole load; no partial graph is published.
    pub fn load(&mut self, descriptor: impl AsRef<Path>) -> Result<()> {
        let rel = descriptor.as_ref();
        let abs = self.root.join(rel);

        let needs_lock = self.options.locked_paths.iter().any(|p| p == rel);
        let _guard = if needs_lock {
            let backoff = Duration::from_millis(self.options.lock_backoff_ms);
            match DirectoryLock::acquire(&abs, self.options.lock_attempts, backoff) {
                Some(guard) => Some(guard),
                None => {
                    warn!(descriptor = ?rel, "descriptor locked; treating as empty this cycle");
                    self.graph = Graph::new();
                    return Ok(());
                }
            }
        } else {
            None
        };

        let doc = match self.read_document(&abs)? {
            Some(doc) => doc,
            None => {
                debug!(descriptor = ?rel, "descriptor missing; empty graph");
                self.graph = Graph::new();
                return Ok(());
            }
        };

        let graph = self.build_graph(&doc, &rel.to_string_lossy())?;
        info!(
            descriptor = ?rel,
            nodes = graph.len(),
            "loaded pipeline descriptor"
        );
        self.graph = graph;
        Ok(())
    }

    /// Probe exit-status markers for every job node.
    ///
    /// Marker races (a file removed between cycles or mid-probe) read as
    /// "not present"; nothing here can fail.
    pub fn check_statuses(&mut self) {
        status::check_statuses(&mut self.graph, &self.root, &self.options.markers);
    }

    /// Scan execution logs for job start times and repeat counts.
    pub fn collect_times(&mut self, logs: &[PathBuf]) {
        let records = times::scan_logs(logs, &self.execution_re);
        times::apply_times(&mut self.graph, &records);
    }

    /// Expand the configured log glob under the project root.
    pub fn find_logs(&self) -> Result<Vec<PathBuf>> {
        times::find_logs(&self.root, &self.options.log_glob)
    }

    /// Collapse the current graph into dependency-ordered job-type nodes.
    ///
    /// Pure and re-derivable: the reader's own graph is never mutated, so
    /// this is safe to call repeatedly as new instances appear.
    pub fn job_types(&self) -> Result<Vec<JobTypeNode>> {
        collapse::collapse_to_job_types(&self.graph, &self.options.collapse_origin)
    }

    fn read_document(&mut self, abs: &Path) -> Result<Option<Document>> {
        let mtime = match std::fs::metadata(abs) {
            Ok(meta) => meta.modified().ok(),
            Err(_) => return Ok(None),
        };

        if let Some(mtime) = mtime {
            if let Some(doc) = self.cache.lookup(abs, mtime) {
                debug!(descriptor = ?abs, "descriptor served from cache");
                return Ok(Some(doc.clone()));
            }
        }

        let text = match std::fs::read_to_string(abs) {
            Ok(text) => text,
            // The writer may have swapped the file out between the stat and
            // the read; next poll catches up.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let doc = Document::parse(&text, &abs.to_string_lossy())?;
        if let Some(mtime) = mtime {
            self.cache.store(abs, mtime, doc.clone());
        }
        Ok(Some(doc))
    }

    fn build_graph(&self, doc: &Document, path: &str) -> Result<Graph> {
        let mut graph = Graph::new();

        // File nodes from the output-node block.
        for name in doc.column_in_block_with(NODE_NAME_COLUMN, NODE_NAME_COLUMN) {
            let node_path = name.trim_end_matches('/');
            if graph.contains(node_path) {
                continue;
            }
            let mut node = Node::new(node_path, NodeKind::File);
            self.annotator.annotate(&mut node);
            graph.insert(node)?;
        }

        // Job nodes (with optional aliases) from the process block.
        if let Some(block) = doc.block_with_column(PROCESS_NAME_COLUMN) {
            let names = block.column(PROCESS_NAME_COLUMN).unwrap_or_default();
            let aliases = block.column(PROCESS_ALIAS_COLUMN);

            for (i, name) in names.iter().enumerate() {
                let node_path = name.trim_end_matches('/');
                if graph.contains(node_path) {
                    continue;
                }
                let mut node = Node::new(node_path, NodeKind::Job);
                if let Some(alias) = aliases.as_ref().and_then(|col| col.get(i)) {
                    if *alias != "None" {
                        node.env.alias = Some(alias.trim_end_matches('/').to_string());
                    }
                }
                graph.insert(node)?;
            }
        }

        // Input edges: artifact -> consuming job.
        if let Some(block) = doc.block_with_column(EDGE_FROM_COLUMN) {
            let froms = block.column(EDGE_FROM_COLUMN).unwrap_or_default();
            let procs = block.column(EDGE_PROCESS_COLUMN).unwrap_or_default();
            for (from, proc) in froms.iter().zip(procs.iter()) {
                link_checked(&mut graph, from, proc, path)?;
            }
        }

        // Output edges: producing job -> artifact.
        if let Some(block) = doc.block_with_column(EDGE_TO_COLUMN) {
            let procs = block.column(EDGE_PROCESS_COLUMN).unwrap_or_default();
            let tos = block.column(EDGE_TO_COLUMN).unwrap_or_default();
            for (proc, to) in procs.iter().zip(tos.iter()) {
                link_checked(&mut graph, proc, to, path)?;
            }
        }

        Ok(graph)
    }
}

/// Resolve both endpoints by path; an endpoint absent from the freshly
/// parsed node set is a fatal error for this document, never silently
/// dropped.
fn link_checked(graph: &mut Graph, from: &str, to: &str, path: &str) -> Result<()> {
    let from = from.trim_end_matches('/');
    let to = to.trim_end_matches('/');

    for endpoint in [from, to] {
        if !graph.contains(endpoint) {
            return Err(PipewatchError::UnknownEdgeEndpoint {
                endpoint: endpoint.to_string(),
                path: path.to_string(),
            });
        }
    }

    graph.link(from, to, Default::default(), None)?;
    Ok(())
}
