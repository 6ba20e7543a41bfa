// src/reader/descriptor.rs

//! Parser for the external tool's block/column descriptor format.
//!
//! The descriptor is line-oriented: optional `data_<name>` headers open a
//! block, `loop_` introduces a column group, `_column_name` lines declare the
//! columns, and every following non-blank line is a whitespace-separated row
//! whose width must equal the column count. `#` starts a comment.
//!
//! Access is by column, not by block name: callers find the block containing
//! a distinctive column, then read whichever columns of that block they need.

use crate::errors::{PipewatchError, Result};

pub const NODE_NAME_COLUMN: &str = "_pipeline_node_name";
pub const PROCESS_NAME_COLUMN: &str = "_pipeline_process_name";
pub const PROCESS_ALIAS_COLUMN: &str = "_pipeline_process_alias";
pub const EDGE_FROM_COLUMN: &str = "_pipeline_edge_from_node";
pub const EDGE_PROCESS_COLUMN: &str = "_pipeline_edge_process";
pub const EDGE_TO_COLUMN: &str = "_pipeline_edge_to_node";

/// One `loop_` column group: named columns and their rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Block {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// All values of the named column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }
}

/// A parsed descriptor document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Parse the descriptor text. Malformed rows are structural errors; the
    /// caller gets no partial document.
    pub fn parse(text: &str, path: &str) -> Result<Document> {
        let mut blocks: Vec<Block> = Vec::new();
        let mut current: Option<Block> = None;
        let mut in_header = false;

        for (lineno, raw) in text.lines().enumerate() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with("data_") {
                // Block headers only delimit; rows bind to the nearest loop_.
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
                in_header = false;
                continue;
            }

            if line == "loop_" {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
                current = Some(Block {
                    columns: Vec::new(),
                    rows: Vec::new(),
                });
                in_header = true;
                continue;
            }

            if line.starts_with('_') {
                match current.as_mut() {
                    Some(block) if in_header => {
                        block.columns.push(line.to_string());
                        continue;
                    }
                    _ => {
                        return Err(PipewatchError::DescriptorParse {
                            path: path.to_string(),
                            message: format!(
                                "line {}: column declaration outside a loop_ header",
                                lineno + 1
                            ),
                        });
                    }
                }
            }

            // Data row.
            in_header = false;
            let block = current.as_mut().ok_or_else(|| PipewatchError::DescriptorParse {
                path: path.to_string(),
                message: format!("line {}: data row outside any loop_", lineno + 1),
            })?;

            let fields: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if fields.len() != block.columns.len() {
                return Err(PipewatchError::DescriptorParse {
                    path: path.to_string(),
                    message: format!(
                        "line {}: expected {} fields, found {}",
                        lineno + 1,
                        block.columns.len(),
                        fields.len()
                    ),
                });
            }
            block.rows.push(fields);
        }

        if let Some(block) = current.take() {
            blocks.push(block);
        }

        Ok(Document { blocks })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The first block carrying the named column.
    pub fn block_with_column(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.has_column(name))
    }

    /// Convenience: find the block containing `lookup`, then read `wanted`
    /// from it. Empty when either lookup fails.
    pub fn column_in_block_with(&self, lookup: &str, wanted: &str) -> Vec<&str> {
        self.block_with_column(lookup)
            .and_then(|b| b.column(wanted))
            .unwrap_or_default()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}
