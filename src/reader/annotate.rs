// src/reader/annotate.rs

//! Load-time semantic annotations on file nodes.
//!
//! These are the only two cross-cutting annotations the core injects; every
//! other job-specific meaning is left to external collaborators. Both are
//! staged onto the file node's propagate store so they flow to all downstream
//! consumers during collapse.

use regex::Regex;

use crate::errors::{PipewatchError, Result};
use crate::graph::env::{EnvValue, KEY_BATCH_NUMBER, KEY_INIT_MODEL_CLASS_NUM};
use crate::graph::Node;

#[derive(Debug)]
pub(crate) struct Annotator {
    split_re: Regex,
    class_re: Regex,
    init_model_prefix: String,
}

impl Annotator {
    pub(crate) fn new(init_model_prefix: &str) -> Result<Self> {
        let split_re = Regex::new(r"_split(\d+)\.[^./]+$")
            .map_err(|e| PipewatchError::ConfigError(format!("batch-split pattern: {e}")))?;
        let class_re = Regex::new(r"_class(\d+)\.[^./]+$")
            .map_err(|e| PipewatchError::ConfigError(format!("class-number pattern: {e}")))?;
        Ok(Self {
            split_re,
            class_re,
            init_model_prefix: init_model_prefix.to_string(),
        })
    }

    /// Stage `batch_number` / `init_model_class_num` onto matching file
    /// nodes.
    ///
    /// - `<stage>/<job>/..._split<N>.<ext>` is a batch-split output; `N`
    ///   becomes `batch_number`.
    /// - `<init_model_prefix>/<job>/..._class<N>.<ext>` is a per-class
    ///   output; `N` becomes `init_model_class_num`.
    pub(crate) fn annotate(&self, node: &mut Node) {
        let path = node.path().to_string();

        if let Some(n) = capture_number(&self.split_re, &path) {
            node.env.stage(KEY_BATCH_NUMBER, EnvValue::Number(n));
            return;
        }

        let under_init_model = path.starts_with(&format!("{}/", self.init_model_prefix));
        if under_init_model {
            if let Some(n) = capture_number(&self.class_re, &path) {
                node.env.stage(KEY_INIT_MODEL_CLASS_NUM, EnvValue::Number(n));
            }
        }
    }
}

fn capture_number(re: &Regex, path: &str) -> Option<i64> {
    re.captures(path)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}
