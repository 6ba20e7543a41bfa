// src/graph/env.rs

//! Per-node key/value environment with a pending "propagate" sub-store.
//!
//! The environment keeps a small set of well-known, typed fields used by the
//! core (status, timestamps, repeat count, batch/class annotations) plus an
//! open string-keyed bag for collaborator-defined values. The propagate store
//! is a pending set of pairs: a node flushes it into its own environment when
//! it is visited during traversal, and the flushed pairs are copied onto the
//! propagate stores of its successors so a value can travel multiple hops
//! without the intermediate nodes knowing its meaning.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::types::JobStatus;

pub const KEY_STATUS: &str = "status";
pub const KEY_START_TIME: &str = "start_time";
pub const KEY_END_TIME: &str = "end_time";
pub const KEY_JOB_COUNT: &str = "job_count";
pub const KEY_BATCH_NUMBER: &str = "batch_number";
pub const KEY_INIT_MODEL_CLASS_NUM: &str = "init_model_class_num";
pub const KEY_ALIAS: &str = "alias";
pub const KEY_JOB_STRING: &str = "job_string";

/// A value stored in a node environment, an edge traffic table or a
/// propagate store.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvValue {
    Text(String),
    Number(i64),
    Flag(bool),
    Time(DateTime<Utc>),
}

impl EnvValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            EnvValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EnvValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            EnvValue::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Text(s) => f.write_str(s),
            EnvValue::Number(n) => write!(f, "{n}"),
            EnvValue::Flag(b) => write!(f, "{b}"),
            EnvValue::Time(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

/// Typed per-node environment plus the open bag and the propagate store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub status: Option<JobStatus>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub job_count: Option<u32>,
    pub batch_number: Option<u32>,
    pub init_model_class_num: Option<u32>,
    pub alias: Option<String>,
    pub job_string: Option<String>,

    extras: BTreeMap<String, EnvValue>,
    propagate: BTreeMap<String, EnvValue>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, routing well-known keys to the typed fields and
    /// everything else into the open bag.
    ///
    /// A well-known key carrying an unexpected value shape lands in the bag
    /// rather than being coerced.
    pub fn set(&mut self, key: &str, value: EnvValue) {
        match (key, &value) {
            (KEY_STATUS, EnvValue::Text(s)) => {
                if let Ok(status) = JobStatus::from_str(s) {
                    self.status = Some(status);
                    return;
                }
            }
            (KEY_START_TIME, EnvValue::Time(t)) => {
                self.start_time = Some(*t);
                return;
            }
            (KEY_END_TIME, EnvValue::Time(t)) => {
                self.end_time = Some(*t);
                return;
            }
            (KEY_JOB_COUNT, EnvValue::Number(n)) if *n >= 0 => {
                self.job_count = Some(*n as u32);
                return;
            }
            (KEY_BATCH_NUMBER, EnvValue::Number(n)) if *n >= 0 => {
                self.batch_number = Some(*n as u32);
                return;
            }
            (KEY_INIT_MODEL_CLASS_NUM, EnvValue::Number(n)) if *n >= 0 => {
                self.init_model_class_num = Some(*n as u32);
                return;
            }
            (KEY_ALIAS, EnvValue::Text(s)) => {
                self.alias = Some(s.clone());
                return;
            }
            (KEY_JOB_STRING, EnvValue::Text(s)) => {
                self.job_string = Some(s.clone());
                return;
            }
            _ => {}
        }
        self.extras.insert(key.to_string(), value);
    }

    /// Read a value back, synthesizing from the typed fields for well-known
    /// keys.
    pub fn get(&self, key: &str) -> Option<EnvValue> {
        match key {
            KEY_STATUS => self.status.map(|s| EnvValue::Text(s.to_string())),
            KEY_START_TIME => self.start_time.map(EnvValue::Time),
            KEY_END_TIME => self.end_time.map(EnvValue::Time),
            KEY_JOB_COUNT => self.job_count.map(|n| EnvValue::Number(n as i64)),
            KEY_BATCH_NUMBER => self.batch_number.map(|n| EnvValue::Number(n as i64)),
            KEY_INIT_MODEL_CLASS_NUM => {
                self.init_model_class_num.map(|n| EnvValue::Number(n as i64))
            }
            KEY_ALIAS => self.alias.clone().map(EnvValue::Text),
            KEY_JOB_STRING => self.job_string.clone().map(EnvValue::Text),
            other => self.extras.get(other).cloned(),
        }
    }

    /// Values in the open bag only.
    pub fn extras(&self) -> &BTreeMap<String, EnvValue> {
        &self.extras
    }

    /// Stage a pending propagate value; it takes effect on the next
    /// [`Environment::flush_pending`].
    pub fn stage(&mut self, key: &str, value: EnvValue) {
        self.propagate.insert(key.to_string(), value);
    }

    /// Pending propagate pairs not yet flushed.
    pub fn pending(&self) -> &BTreeMap<String, EnvValue> {
        &self.propagate
    }

    pub fn has_pending(&self, key: &str) -> bool {
        self.propagate.contains_key(key)
    }

    /// Apply all pending pairs to this environment and return them so the
    /// caller can copy them across outgoing edges.
    pub fn flush_pending(&mut self) -> Vec<(String, EnvValue)> {
        let pending = std::mem::take(&mut self.propagate);
        let flushed: Vec<(String, EnvValue)> = pending.into_iter().collect();
        for (key, value) in &flushed {
            self.set(key, value.clone());
        }
        flushed
    }
}
