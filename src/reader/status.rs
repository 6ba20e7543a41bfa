// src/reader/status.rs

//! Job status inference from exit-status marker files.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::MarkerNames;
use crate::graph::env::EnvValue;
use crate::graph::Graph;
use crate::types::{JobStatus, NodeKind};

/// Result of probing one job directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StatusProbe {
    pub status: JobStatus,
    pub end_time: Option<DateTime<Utc>>,
    pub aborted: bool,
}

/// Probe the three mutually exclusive markers in a job directory.
///
/// A single `fs::metadata` call per marker, so a marker deleted between
/// cycles (or mid-probe by the external writer) simply reads as "not
/// present"; probe errors are never propagated. All three markers are
/// checked before concluding `Unknown`.
pub(crate) fn probe_job_dir(dir: &Path, markers: &MarkerNames) -> StatusProbe {
    let candidates = [
        (markers.success.as_str(), JobStatus::Success, false),
        (markers.failure.as_str(), JobStatus::Failure, false),
        (markers.aborted.as_str(), JobStatus::Failure, true),
    ];

    for (name, status, aborted) in candidates {
        match fs::metadata(dir.join(name)) {
            Ok(meta) => {
                let end_time = meta.modified().ok().map(DateTime::<Utc>::from);
                return StatusProbe {
                    status,
                    end_time,
                    aborted,
                };
            }
            Err(e) => {
                // Covers both a genuinely absent marker and one that vanished
                // mid-probe.
                debug!(marker = name, dir = ?dir, error = %e, "marker not present");
            }
        }
    }

    StatusProbe {
        status: JobStatus::Unknown,
        end_time: None,
        aborted: false,
    }
}

/// Annotate every job node in `graph` with status and end time.
pub(crate) fn check_statuses(graph: &mut Graph, root: &Path, markers: &MarkerNames) {
    for node in graph.iter_mut() {
        if node.kind() != NodeKind::Job {
            continue;
        }
        let dir = root.join(node.path());
        let probe = probe_job_dir(&dir, markers);
        node.env.status = Some(probe.status);
        if probe.end_time.is_some() {
            node.env.end_time = probe.end_time;
        }
        if probe.aborted {
            node.env.set("aborted", EnvValue::Flag(true));
        }
    }
}
