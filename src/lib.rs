// src/lib.rs

//! Observe an on-disk, incrementally-growing processing pipeline written by
//! an external tool, and expose it as a queryable dependency graph plus a
//! stream of result records safe to forward at most once downstream.
//!
//! The external tool appends job and edge records to a descriptor file,
//! writes per-job exit-status markers and execution logs, and may rewrite
//! the descriptor concurrently; this crate only observes, it never executes
//! or schedules anything.
//!
//! Typical polling cycle:
//!
//! 1. [`reader::PipelineReader::load`] parses the descriptor into a
//!    [`graph::Graph`], under a [`lock::DirectoryLock`] when configured.
//! 2. [`reader::PipelineReader::check_statuses`] and
//!    [`reader::PipelineReader::collect_times`] annotate the job nodes.
//! 3. [`reader::PipelineReader::job_types`] yields the collapsed,
//!    dependency-ordered job-type nodes.
//! 4. The caller pairs each completed job type with a result object (from an
//!    external field-parser collaborator) and hands the snapshot to
//!    [`sync::ResultSynchronizer::consume`]; `fresh()` then holds only the
//!    items never emitted before.

pub mod config;
pub mod errors;
pub mod graph;
pub mod lock;
pub mod logging;
pub mod reader;
pub mod sync;
pub mod types;

use std::path::Path;

use crate::errors::Result;
use crate::reader::{JobTypeNode, PipelineReader};

/// One full observation cycle: load, annotate, collapse.
///
/// Convenience wrapper over the individual reader calls for callers that do
/// not need to interleave their own work between the steps. Transient
/// conditions (locked or missing descriptor) yield an empty sequence.
pub fn scan_project(reader: &mut PipelineReader, descriptor: &Path) -> Result<Vec<JobTypeNode>> {
    reader.load(descriptor)?;
    reader.check_statuses();
    let logs = reader.find_logs()?;
    reader.collect_times(&logs);
    reader.job_types()
}
