#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use pipewatch::graph::{Graph, Node};
use pipewatch::reader::descriptor::{
    EDGE_FROM_COLUMN, EDGE_PROCESS_COLUMN, EDGE_TO_COLUMN, NODE_NAME_COLUMN,
    PROCESS_ALIAS_COLUMN, PROCESS_NAME_COLUMN,
};
use pipewatch::types::NodeKind;

/// Builder for descriptor documents in the external tool's block/column
/// format, to simplify test setup.
#[derive(Debug, Default, Clone)]
pub struct DescriptorBuilder {
    file_nodes: Vec<String>,
    processes: Vec<(String, Option<String>)>,
    input_edges: Vec<(String, String)>,
    output_edges: Vec<(String, String)>,
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_node(mut self, path: &str) -> Self {
        self.file_nodes.push(path.to_string());
        self
    }

    pub fn process(mut self, path: &str) -> Self {
        self.processes.push((path.to_string(), None));
        self
    }

    pub fn process_with_alias(mut self, path: &str, alias: &str) -> Self {
        self.processes
            .push((path.to_string(), Some(alias.to_string())));
        self
    }

    /// Edge: artifact consumed by a job.
    pub fn input_edge(mut self, from_file: &str, process: &str) -> Self {
        self.input_edges
            .push((from_file.to_string(), process.to_string()));
        self
    }

    /// Edge: artifact produced by a job.
    pub fn output_edge(mut self, process: &str, to_file: &str) -> Self {
        self.output_edges
            .push((process.to_string(), to_file.to_string()));
        self
    }

    /// Render the descriptor text.
    pub fn build(&self) -> String {
        let mut out = String::from("data_pipeline\n\n");

        out.push_str("loop_\n");
        out.push_str(NODE_NAME_COLUMN);
        out.push('\n');
        for node in &self.file_nodes {
            out.push_str(node);
            out.push('\n');
        }
        out.push('\n');

        out.push_str("loop_\n");
        out.push_str(PROCESS_NAME_COLUMN);
        out.push('\n');
        out.push_str(PROCESS_ALIAS_COLUMN);
        out.push('\n');
        for (process, alias) in &self.processes {
            out.push_str(&format!(
                "{} {}\n",
                process,
                alias.as_deref().unwrap_or("None")
            ));
        }
        out.push('\n');

        out.push_str("loop_\n");
        out.push_str(EDGE_FROM_COLUMN);
        out.push('\n');
        out.push_str(EDGE_PROCESS_COLUMN);
        out.push('\n');
        for (from, process) in &self.input_edges {
            out.push_str(&format!("{from} {process}\n"));
        }
        out.push('\n');

        out.push_str("loop_\n");
        out.push_str(EDGE_PROCESS_COLUMN);
        out.push('\n');
        out.push_str(EDGE_TO_COLUMN);
        out.push('\n');
        for (process, to) in &self.output_edges {
            out.push_str(&format!("{process} {to}\n"));
        }

        out
    }
}

/// Scaffolds an on-disk project directory the way the external tool lays
/// one out: descriptor, per-job marker files, execution logs.
#[derive(Debug)]
pub struct ProjectBuilder {
    root: PathBuf,
}

impl ProjectBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_descriptor(&self, name: &str, descriptor: &DescriptorBuilder) -> Result<()> {
        self.write_file(name, &descriptor.build())
    }

    /// Create an exit-status marker inside a job directory.
    pub fn write_marker(&self, job_path: &str, marker: &str) -> Result<()> {
        let dir = self.root.join(job_path);
        fs::create_dir_all(&dir).with_context(|| format!("creating job dir {dir:?}"))?;
        fs::write(dir.join(marker), b"").with_context(|| format!("writing marker {marker}"))?;
        Ok(())
    }

    /// Append execution records to a log, one per (timestamp, job path)
    /// pair, in the tool's two-line layout.
    pub fn write_execution_log(
        &self,
        name: &str,
        entries: &[(DateTime<Utc>, &str)],
    ) -> Result<()> {
        let mut contents = String::new();
        for (stamp, job) in entries {
            contents.push_str(&stamp.format("%H:%M:%S %a %b %d %Y").to_string());
            contents.push('\n');
            contents.push_str(&format!(" executing new job: {job}/\n"));
        }
        self.write_file(name, &contents)
    }

    pub fn write_file(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {parent:?}"))?;
        }
        fs::write(&path, contents).with_context(|| format!("writing {path:?}"))?;
        Ok(())
    }
}

/// Build a job-only graph from (from, to) edge pairs, inserting nodes in
/// first-mention order.
pub fn job_graph_of(edges: &[(&str, &str)]) -> Graph {
    let mut graph = Graph::new();
    for (from, to) in edges {
        for path in [from, to] {
            if !graph.contains(path) {
                graph
                    .insert(Node::new(*path, NodeKind::Job))
                    .expect("duplicate node in builder");
            }
        }
        graph
            .link(from, to, Default::default(), None)
            .expect("linking builder edge");
    }
    graph
}
