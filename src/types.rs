// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Hierarchical, slash-delimited, case-sensitive node identity.
///
/// Unique within a [`crate::graph::Graph`]; job paths look like
/// `"MotionCorr/job002"`, file paths like `"Import/job001/movies.star"`.
pub type NodePath = String;

/// The two node families the descriptor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A data artifact produced/consumed between jobs.
    File,
    /// One concrete run of a processing stage.
    Job,
}

/// Completion status of a job, inferred from marker files.
///
/// The external tool writes one of three mutually exclusive markers into the
/// job directory. The aborted marker maps to `Failure` (with an `"aborted"`
/// flag in the node's environment); no marker at all means the job is still
/// running or was never started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Failure,
    Unknown,
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Unknown
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "success" => Ok(JobStatus::Success),
            "failure" => Ok(JobStatus::Failure),
            "unknown" => Ok(JobStatus::Unknown),
            other => Err(format!(
                "invalid job status: {other} (expected \"success\", \"failure\" or \"unknown\")"
            )),
        }
    }
}
