//! Graph source: where node/edge data comes from and where final positions
//! are persisted.
//!
//! The persistent store is an external collaborator; the pipeline only relies
//! on the [`GraphSource`] contract. [`JsonGraphSource`] is the file-backed
//! implementation shipped with the CLI.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::graph::GraphData;

/// Errors from reading or writing a graph source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source cannot be read at all. Fatal to the run.
    #[error("graph source unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    /// The source was readable but did not parse.
    #[error("malformed graph source: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The final position write-back failed. Rendered imagery stays valid.
    #[error("failed to persist positions: {0}")]
    Persist(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Supplies node ids/labels and the edge list; persists final positions.
pub trait GraphSource {
    fn list_nodes(&self) -> Vec<(String, Option<String>)>;

    fn list_edges(&self) -> Vec<(String, String)>;

    /// Previously persisted position for a node, if any.
    fn get_position(&self, id: &str) -> Option<(f32, f32)>;

    /// Persist the final position of every node in the mapping.
    fn set_positions(&mut self, positions: &HashMap<String, (f32, f32)>) -> SourceResult<()>;
}

/// Graph source backed by a JSON file in the serde graph format: a `nodes`
/// array with optional `label`/`x`/`y` fields plus an `edges` array.
#[derive(Debug)]
pub struct JsonGraphSource {
    path: PathBuf,
    data: GraphData,
}

impl JsonGraphSource {
    pub fn open(path: &Path) -> SourceResult<Self> {
        let text = fs::read_to_string(path)?;
        let data: GraphData = serde_json::from_str(&text)?;
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn data(&self) -> &GraphData {
        &self.data
    }
}

impl GraphSource for JsonGraphSource {
    fn list_nodes(&self) -> Vec<(String, Option<String>)> {
        self.data
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.label.clone()))
            .collect()
    }

    fn list_edges(&self) -> Vec<(String, String)> {
        self.data
            .edges
            .iter()
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect()
    }

    fn get_position(&self, id: &str) -> Option<(f32, f32)> {
        let node = self.data.nodes.iter().find(|n| n.id == id)?;
        match (node.x, node.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    fn set_positions(&mut self, positions: &HashMap<String, (f32, f32)>) -> SourceResult<()> {
        for node in &mut self.data.nodes {
            if let Some(&(x, y)) = positions.get(&node.id) {
                node.x = Some(x);
                node.y = Some(y);
            }
        }
        let text = serde_json::to_string_pretty(&self.data)
            .map_err(|e| SourceError::Persist(e.to_string()))?;
        fs::write(&self.path, text).map_err(|e| SourceError::Persist(e.to_string()))
    }
}
