// src/reader/times.rs

//! Job start times and repeat counts from execution logs.
//!
//! The logs are append-only and line-oriented. An execution record is a line
//! matching the configured execution regex (capture group 1 = job path); its
//! timestamp sits on the immediately preceding line in the tool's five-field
//! layout: time, weekday, month abbreviation, day number, year, e.g.
//!
//! ```text
//! 15:23:45 Mon Sep 14 2020
//!  executing new job on host node12: MotionCorr/job002/
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result as AnyResult};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use globset::Glob;
use regex::Regex;
use tracing::{debug, warn};

use crate::errors::{PipewatchError, Result};
use crate::graph::env::EnvValue;
use crate::graph::Graph;
use crate::types::{NodeKind, NodePath};

pub(crate) const KEY_START_TIME_DISPLAY: &str = "start_time_display";
pub(crate) const KEY_END_TIME_DISPLAY: &str = "end_time_display";

/// Aggregated execution history for one job path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExecutionRecord {
    /// Earliest timestamp seen across all executions.
    pub earliest: DateTime<Utc>,
    /// Total number of distinct executions (repeat count).
    pub count: u32,
}

/// Scan the given logs for execution records.
///
/// An unreadable log is skipped with a warning: logs appear and rotate under
/// the external tool's control, so their absence is transient.
pub(crate) fn scan_logs(
    logs: &[PathBuf],
    line_re: &Regex,
) -> HashMap<NodePath, ExecutionRecord> {
    let mut records: HashMap<NodePath, ExecutionRecord> = HashMap::new();

    for log in logs {
        match scan_one_log(log, line_re, &mut records) {
            Ok(lines) => debug!(log = ?log, lines, "scanned execution log"),
            Err(e) => warn!(log = ?log, error = %e, "skipping unreadable execution log"),
        }
    }

    records
}

fn scan_one_log(
    log: &Path,
    line_re: &Regex,
    records: &mut HashMap<NodePath, ExecutionRecord>,
) -> AnyResult<usize> {
    let file = File::open(log).with_context(|| format!("opening log {log:?}"))?;
    let reader = BufReader::new(file);

    let mut previous: Option<String> = None;
    let mut count = 0usize;

    for line_res in reader.lines() {
        let line = line_res.with_context(|| format!("reading log {log:?}"))?;
        count += 1;

        if let Some(caps) = line_re.captures(&line) {
            let job = caps
                .get(1)
                .map(|m| m.as_str().trim_end_matches('/').to_string());
            let stamp = previous.as_deref().and_then(parse_stamp);

            if let (Some(job), Some(stamp)) = (job, stamp) {
                records
                    .entry(job)
                    .and_modify(|r| {
                        r.count += 1;
                        if stamp < r.earliest {
                            r.earliest = stamp;
                        }
                    })
                    .or_insert(ExecutionRecord {
                        earliest: stamp,
                        count: 1,
                    });
            }
        }

        previous = Some(line);
    }

    Ok(count)
}

/// Parse the five-field timestamp line: time, weekday, month-abbrev, day,
/// year. The weekday is decorative and not validated.
fn parse_stamp(line: &str) -> Option<DateTime<Utc>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return None;
    }
    let composed = format!("{} {} {} {}", fields[2], fields[3], fields[4], fields[0]);
    NaiveDateTime::parse_from_str(&composed, "%b %d %Y %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Apply scanned execution records to the job nodes of `graph`.
///
/// Absolute start times and repeat counts land in the typed environment
/// fields; whole-second offsets from the earliest start across all jobs go
/// into the extras bag for human display only.
pub(crate) fn apply_times(graph: &mut Graph, records: &HashMap<NodePath, ExecutionRecord>) {
    for node in graph.iter_mut() {
        if node.kind() != NodeKind::Job {
            continue;
        }
        if let Some(record) = records.get(node.path()) {
            node.env.start_time = Some(record.earliest);
            node.env.job_count = Some(record.count);
        }
    }

    let zero_origin = graph
        .iter()
        .filter(|n| n.kind() == NodeKind::Job)
        .filter_map(|n| n.env.start_time)
        .min();

    let Some(origin) = zero_origin else {
        return;
    };

    for node in graph.iter_mut() {
        if node.kind() != NodeKind::Job {
            continue;
        }
        if let Some(start) = node.env.start_time {
            let offset = (start - origin).num_seconds();
            node.env
                .set(KEY_START_TIME_DISPLAY, EnvValue::Number(offset));
        }
        if let Some(end) = node.env.end_time {
            let offset = (end - origin).num_seconds();
            node.env.set(KEY_END_TIME_DISPLAY, EnvValue::Number(offset));
        }
    }
}

/// Expand a log glob (relative to `root`) into concrete log paths, sorted
/// for deterministic scan order.
pub(crate) fn find_logs(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let glob = Glob::new(pattern)
        .map_err(|e| PipewatchError::ConfigError(format!("log_glob is not a valid glob: {e}")))?
        .compile_matcher();

    let mut logs = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = ?dir, error = %e, "skipping unreadable directory");
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if let Ok(rel) = path.strip_prefix(root) {
                let rel_str = rel.to_string_lossy().replace('\\', "/");
                if glob.is_match(&rel_str) {
                    logs.push(path);
                }
            }
        }
    }

    logs.sort();
    Ok(logs)
}
