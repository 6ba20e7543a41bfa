// src/sync/mod.rs

//! Incremental result synchronization with at-most-once delivery.
//!
//! The caller hands over a snapshot of everything currently known per
//! completed job type; [`ResultSynchronizer`] remembers what it has already
//! emitted (by caller-supplied fingerprint) and surfaces only the remainder.
//! State is in-memory only: the external contract is "send everything, then
//! diff", so a restarted process simply reseeds from the next full snapshot.

pub mod fingerprint;

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

pub use fingerprint::fingerprint_fields;

/// One completed job's contribution to a snapshot: its result items, the
/// job-type string, and the end time the items were produced under.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRecord<T> {
    pub items: Vec<T>,
    pub job_type: String,
    pub end_time: DateTime<Utc>,
}

impl<T> SyncRecord<T> {
    pub fn new(items: Vec<T>, job_type: impl Into<String>, end_time: DateTime<Utc>) -> Self {
        Self {
            items,
            job_type: job_type.into(),
            end_time,
        }
    }
}

/// Items from one job type that were not previously emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct FreshBatch<T> {
    pub items: Vec<T>,
    pub job_type: String,
}

/// Deduplicates result items across repeated snapshots.
///
/// Mode is explicit state rather than being inferred from call order: the
/// synchronizer starts in seeding mode, where the first [`Self::consume`]
/// treats everything as fresh and switches to diffing; callers that want
/// diff-from-empty semantics call [`Self::start_diffing`] up front.
pub struct ResultSynchronizer<T, F>
where
    F: Fn(&T) -> String,
{
    fingerprint: F,
    /// job-type -> fingerprints already emitted; grows monotonically.
    cache: BTreeMap<String, Vec<String>>,
    /// (job-type, end-time) pairs already consumed.
    seen: HashSet<(String, DateTime<Utc>)>,
    all: Vec<(Vec<T>, String)>,
    fresh: Vec<FreshBatch<T>>,
    diffing: bool,
}

impl<T, F> ResultSynchronizer<T, F>
where
    T: Clone,
    F: Fn(&T) -> String,
{
    pub fn new(fingerprint: F) -> Self {
        Self {
            fingerprint,
            cache: BTreeMap::new(),
            seen: HashSet::new(),
            all: Vec::new(),
            fresh: Vec::new(),
            diffing: false,
        }
    }

    /// Skip the seeding pass: the next [`Self::consume`] diffs against an
    /// empty cache, so everything it sees is fresh *and* fingerprinted.
    pub fn start_diffing(&mut self) {
        self.diffing = true;
    }

    pub fn is_diffing(&self) -> bool {
        self.diffing
    }

    /// Ingest a snapshot of all currently-known completed jobs.
    ///
    /// The first call seeds the fingerprint cache and treats every item as
    /// fresh; later calls skip records whose (job-type, end-time) pair was
    /// already consumed and drop items whose fingerprint was emitted under a
    /// different end time (a deleted-and-rerun job producing overlapping
    /// rows).
    pub fn consume(&mut self, snapshot: Vec<SyncRecord<T>>) {
        self.all = snapshot
            .iter()
            .map(|r| (r.items.clone(), r.job_type.clone()))
            .collect();
        self.fresh.clear();

        let seeding = !self.diffing;
        self.diffing = true;

        for record in snapshot {
            let pair_is_new = self.seen.insert((record.job_type.clone(), record.end_time));
            if !seeding && !pair_is_new {
                continue;
            }

            let cached = self.cache.entry(record.job_type.clone()).or_default();
            let mut fresh_items = Vec::new();

            for item in record.items {
                let print = (self.fingerprint)(&item);
                if cached.iter().any(|p| *p == print) {
                    if seeding {
                        // First pass: already-cached duplicates still count
                        // as fresh; everything in the first snapshot does.
                        fresh_items.push(item);
                    }
                    continue;
                }
                cached.push(print);
                fresh_items.push(item);
            }

            if !fresh_items.is_empty() {
                self.fresh.push(FreshBatch {
                    items: fresh_items,
                    job_type: record.job_type,
                });
            }
        }

        debug!(
            batches = self.fresh.len(),
            seeded = seeding,
            "consumed result snapshot"
        );
    }

    /// Drain the fresh set computed by the most recent [`Self::consume`].
    ///
    /// Single-use per consume call: a second invocation yields nothing until
    /// the next snapshot is consumed.
    pub fn fresh(&mut self) -> impl Iterator<Item = FreshBatch<T>> + '_ {
        self.fresh.drain(..)
    }

    /// Everything in the most recent snapshot, as (items, job-type) pairs.
    pub fn all(&self) -> &[(Vec<T>, String)] {
        &self.all
    }
}
