//! Graph data model shared by the layout and rendering stages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A node in the input graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable identifier, unique within the graph.
    pub id: String,

    /// Human-readable label for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Layout position persisted by a previous run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
}

/// An undirected edge between two node ids. Duplicates are permitted and each
/// occurrence contributes its own attractive force.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// Complete graph data as serialized by the source format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

/// Read-only adjacency derived once from the edge list.
///
/// All layout and rendering code works in node indices; the index of a node is
/// its position in the node list handed to [`AdjacencyIndex::build`], and the
/// same ordering is used wherever positions are read back.
#[derive(Debug, Clone)]
pub struct AdjacencyIndex {
    neighbors: Vec<Vec<usize>>,
    edge_pairs: Vec<(usize, usize)>,
}

impl AdjacencyIndex {
    /// Resolve edge endpoints against the node ordering. Edges referencing an
    /// unknown node id are dropped.
    pub fn build(node_ids: &[String], edges: &[(String, String)]) -> Self {
        let index_of: HashMap<&str, usize> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut neighbors = vec![Vec::new(); node_ids.len()];
        let mut edge_pairs = Vec::with_capacity(edges.len());
        for (source, target) in edges {
            let (Some(&u), Some(&v)) = (
                index_of.get(source.as_str()),
                index_of.get(target.as_str()),
            ) else {
                continue;
            };
            neighbors[u].push(v);
            neighbors[v].push(u);
            edge_pairs.push(if u <= v { (u, v) } else { (v, u) });
        }

        Self {
            neighbors,
            edge_pairs,
        }
    }

    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.neighbors[index]
    }

    /// Edge endpoints as ordered index pairs, one entry per edge occurrence.
    pub fn edge_pairs(&self) -> &[(usize, usize)] {
        &self.edge_pairs
    }
}
