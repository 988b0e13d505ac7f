//! End-to-end pipeline: load, lay out, persist, partition, render, pyramid,
//! manifest.
//!
//! Three strictly ordered stages: layout fully completes, positions persist,
//! then rendering begins. The layout and rendering phases are internally
//! parallel; the coordinator blocks on each phase barrier before advancing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use tracing::{info, warn};

use crate::geometry::Point;
use crate::graph::AdjacencyIndex;
use crate::layout::{LayoutConfig, LayoutEngine};
use crate::manifest::Manifest;
use crate::pyramid;
use crate::render;
use crate::source::GraphSource;
use crate::zones::{CanvasGeometry, ZoneGrid};

/// Render tunables recognized by the pipeline, immutable once set.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Canvas pixels per world unit.
    pub pixel_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_size: 256,
            pixel_scale: 10.0,
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub nodes: usize,
    pub edges: usize,
    pub active_zones: usize,
    pub base_tiles: usize,
    pub canvas_px: (u32, u32),
    pub max_level: u32,
}

/// Artifact locations derived from the output base path: the tile directory
/// `{base}_files/` and the sibling manifest `{base}.dzi`.
pub fn artifact_paths(output: &Path) -> (PathBuf, PathBuf) {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("graph");
    let parent = output.parent().map(Path::to_path_buf).unwrap_or_default();
    (
        parent.join(format!("{stem}_files")),
        parent.join(format!("{stem}.dzi")),
    )
}

/// Run the whole visualization. A zero-node graph short-circuits to an empty
/// summary without touching the filesystem.
///
/// A failed position write-back does not abort rendering: the imagery is
/// finished first and the persistence error surfaced afterwards.
pub fn run(
    source: &mut dyn GraphSource,
    output: &Path,
    layout_config: LayoutConfig,
    render_config: RenderConfig,
) -> anyhow::Result<RunSummary> {
    let started = Instant::now();

    let nodes = source.list_nodes();
    let raw_edges = source.list_edges();
    if nodes.is_empty() {
        info!("graph has no nodes; nothing to lay out");
        return Ok(RunSummary::default());
    }
    info!(nodes = nodes.len(), edges = raw_edges.len(), "loaded graph");

    let ids: Vec<String> = nodes.into_iter().map(|(id, _)| id).collect();
    let adjacency = AdjacencyIndex::build(&ids, &raw_edges);

    let initial: Vec<Option<Point>> = ids
        .iter()
        .map(|id| source.get_position(id).map(|(x, y)| Point::new(x, y)))
        .collect();

    let stage = Instant::now();
    let engine = LayoutEngine::new(initial, layout_config);
    let positions = engine.run(&adjacency);
    info!(elapsed = ?stage.elapsed(), "layout complete");

    // Persist before rendering; a failure is logged here and surfaced once
    // the imagery is finished.
    let mapping: HashMap<String, (f32, f32)> = ids
        .iter()
        .cloned()
        .zip(positions.iter().map(|p| (p.x, p.y)))
        .collect();
    let persisted = source.set_positions(&mapping);
    if let Err(err) = &persisted {
        warn!(error = %err, "position write-back failed; imagery will still be rendered");
    }

    let geometry = CanvasGeometry::from_positions(
        &positions,
        render_config.tile_size,
        render_config.pixel_scale,
    )
    .context("canvas geometry for a non-empty graph")?;
    info!(
        width = geometry.width_px,
        height = geometry.height_px,
        cols = geometry.cols,
        rows = geometry.rows,
        max_level = geometry.max_level,
        "canvas geometry"
    );

    let grid = ZoneGrid::build(geometry.clone(), &positions, adjacency.edge_pairs());
    info!(active_zones = grid.active_zones(), "zones assigned");

    let (tiles_dir, manifest_path) = artifact_paths(output);
    std::fs::create_dir_all(&tiles_dir)
        .with_context(|| format!("creating tile directory {}", tiles_dir.display()))?;

    let stage = Instant::now();
    let base_tiles = render::render_base_tiles(&grid, &positions, &tiles_dir)?;
    info!(base_tiles, elapsed = ?stage.elapsed(), "base level rendered");

    let stage = Instant::now();
    pyramid::build_levels(
        &tiles_dir,
        geometry.max_level,
        geometry.cols,
        geometry.rows,
        render_config.tile_size,
    )?;
    info!(elapsed = ?stage.elapsed(), "pyramid levels built");

    let manifest = Manifest {
        width_px: geometry.width_px,
        height_px: geometry.height_px,
        tile_size: geometry.tile_size,
    };
    manifest
        .write(&manifest_path)
        .with_context(|| format!("writing manifest {}", manifest_path.display()))?;

    let summary = RunSummary {
        nodes: ids.len(),
        edges: adjacency.edge_pairs().len(),
        active_zones: grid.active_zones(),
        base_tiles,
        canvas_px: (geometry.width_px, geometry.height_px),
        max_level: geometry.max_level,
    };
    info!(?summary, total = ?started.elapsed(), "visualization complete");

    persisted?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceError, SourceResult};

    /// In-memory source for pipeline tests.
    struct MemorySource {
        nodes: Vec<(String, Option<String>)>,
        edges: Vec<(String, String)>,
        positions: HashMap<String, (f32, f32)>,
        fail_persist: bool,
        persisted: bool,
    }

    impl MemorySource {
        fn new(node_ids: &[&str], edges: &[(&str, &str)]) -> Self {
            Self {
                nodes: node_ids.iter().map(|id| (id.to_string(), None)).collect(),
                edges: edges
                    .iter()
                    .map(|(a, b)| (a.to_string(), b.to_string()))
                    .collect(),
                positions: HashMap::new(),
                fail_persist: false,
                persisted: false,
            }
        }
    }

    impl GraphSource for MemorySource {
        fn list_nodes(&self) -> Vec<(String, Option<String>)> {
            self.nodes.clone()
        }

        fn list_edges(&self) -> Vec<(String, String)> {
            self.edges.clone()
        }

        fn get_position(&self, id: &str) -> Option<(f32, f32)> {
            self.positions.get(id).copied()
        }

        fn set_positions(
            &mut self,
            positions: &HashMap<String, (f32, f32)>,
        ) -> SourceResult<()> {
            if self.fail_persist {
                return Err(SourceError::Persist("disk full".to_string()));
            }
            self.positions = positions.clone();
            self.persisted = true;
            Ok(())
        }
    }

    #[test]
    fn zero_node_graph_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MemorySource::new(&[], &[]);
        let summary = run(
            &mut source,
            &dir.path().join("out"),
            LayoutConfig::default(),
            RenderConfig::default(),
        )
        .unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(!dir.path().join("out_files").exists());
        assert!(!dir.path().join("out.dzi").exists());
    }

    #[test]
    fn single_node_produces_one_tile_per_level() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MemorySource::new(&["only"], &[]);
        let summary = run(
            &mut source,
            &dir.path().join("out"),
            LayoutConfig::default(),
            RenderConfig::default(),
        )
        .unwrap();

        assert_eq!(summary.nodes, 1);
        assert_eq!(summary.active_zones, 1);
        assert_eq!(summary.base_tiles, 1);
        assert!(source.persisted);

        let tiles_dir = dir.path().join("out_files");
        for level in 0..=summary.max_level {
            let files = std::fs::read_dir(tiles_dir.join(level.to_string()))
                .unwrap()
                .count();
            assert_eq!(files, 1, "level {level} should hold exactly one tile");
        }
        assert!(dir.path().join("out.dzi").exists());
    }

    #[test]
    fn persist_failure_surfaces_after_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MemorySource::new(&["a", "b"], &[("a", "b")]);
        source.fail_persist = true;

        let result = run(
            &mut source,
            &dir.path().join("out"),
            LayoutConfig::default(),
            RenderConfig::default(),
        );

        assert!(result.is_err());
        // Imagery was still rendered despite the failed write-back.
        assert!(dir.path().join("out_files").exists());
        assert!(dir.path().join("out.dzi").exists());
    }

    #[test]
    fn persisted_positions_match_node_ordering() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MemorySource::new(&["a", "b", "c"], &[("a", "b")]);
        run(
            &mut source,
            &dir.path().join("out"),
            LayoutConfig::default(),
            RenderConfig::default(),
        )
        .unwrap();

        assert_eq!(source.positions.len(), 3);
        for id in ["a", "b", "c"] {
            let (x, y) = source.positions[id];
            assert!(x.is_finite() && y.is_finite());
        }
    }

    #[test]
    fn artifact_paths_derive_from_stem() {
        let (tiles, manifest) = artifact_paths(Path::new("/tmp/viz/cocktails.png"));
        assert_eq!(tiles, Path::new("/tmp/viz/cocktails_files"));
        assert_eq!(manifest, Path::new("/tmp/viz/cocktails.dzi"));

        let (tiles, manifest) = artifact_paths(Path::new("out"));
        assert_eq!(tiles, Path::new("out_files"));
        assert_eq!(manifest, Path::new("out.dzi"));
    }
}
