//! Rasterizes zones into finest-level tiles.
//!
//! Each zone renders independently: edges are clipped against the zone bounds
//! (expanded by half a pixel so strokes stay continuous across tile seams),
//! drawn first, then node discs on top. Zones with nothing assigned produce no
//! file; the pyramid is expected to be sparse.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use thiserror::Error;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::warn;

use crate::geometry::{Point, clip_segment};
use crate::zones::{CanvasGeometry, Zone, ZoneGrid};

/// Node disc radius in tile pixels.
const NODE_RADIUS: f32 = 10.0;
/// Edge stroke width in tile pixels.
const EDGE_WIDTH: f32 = 1.0;
/// Edge stroke color (gray).
const EDGE_COLOR: (u8, u8, u8) = (128, 128, 128);
/// Node fill color (light blue).
const NODE_COLOR: (u8, u8, u8) = (173, 216, 230);

/// Errors from tile rasterization or compositing.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to allocate a {0}x{0} tile surface")]
    Surface(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode tile image: {0}")]
    Encode(String),
}

/// Render every non-empty zone into `{out_dir}/{max_level}/{col}_{row}.png`.
///
/// Tiles render in parallel; each worker needs only the shared position slice
/// and its own zone. A single tile's failure is logged and the tile skipped
/// (it is simply absent, like an empty region). Failure to create the level
/// directory is fatal to the phase.
pub fn render_base_tiles(
    grid: &ZoneGrid,
    positions: &[Point],
    out_dir: &Path,
) -> Result<usize, RenderError> {
    let geometry = grid.geometry();
    let level_dir = out_dir.join(geometry.max_level.to_string());
    fs::create_dir_all(&level_dir)?;

    let zones: Vec<&Zone> = grid.zones().filter(|z| !z.is_empty()).collect();
    let rendered = zones
        .par_iter()
        .map(|zone| match render_zone(zone, positions, geometry, &level_dir) {
            Ok(()) => 1usize,
            Err(err) => {
                warn!(
                    col = zone.col,
                    row = zone.row,
                    error = %err,
                    "skipping tile after render failure"
                );
                0
            }
        })
        .sum();

    Ok(rendered)
}

/// Rasterize one zone. Pure function of the zone, the shared position slice,
/// and the canvas geometry.
fn render_zone(
    zone: &Zone,
    positions: &[Point],
    geometry: &CanvasGeometry,
    level_dir: &Path,
) -> Result<(), RenderError> {
    let tile_size = geometry.tile_size;
    let mut pixmap = Pixmap::new(tile_size, tile_size).ok_or(RenderError::Surface(tile_size))?;
    pixmap.fill(Color::WHITE);

    let bounds = zone.bounds;
    let tile_px = tile_size as f32;
    // Half a pixel of world-space padding on the clip rect avoids visible
    // seams where a stroke ends exactly on a tile border.
    let clip_rect = bounds.expand(
        bounds.width() / tile_px * 0.5,
        bounds.height() / tile_px * 0.5,
    );

    // World y grows upward; image rows grow downward.
    let to_tile = |p: Point| -> (f32, f32) {
        let x = (p.x - bounds.min_x) / bounds.width() * tile_px;
        let y = (bounds.max_y - p.y) / bounds.height() * tile_px;
        (x, y)
    };

    let mut edge_paint = Paint::default();
    edge_paint.set_color_rgba8(EDGE_COLOR.0, EDGE_COLOR.1, EDGE_COLOR.2, 255);
    edge_paint.anti_alias = true;
    let stroke = Stroke {
        width: EDGE_WIDTH,
        ..Stroke::default()
    };

    for &(u, v) in &zone.edges {
        let Some((a, b)) = clip_segment(positions[u], positions[v], &clip_rect) else {
            continue;
        };
        let (x1, y1) = to_tile(a);
        let (x2, y2) = to_tile(b);
        let mut pb = PathBuilder::new();
        pb.move_to(x1, y1);
        pb.line_to(x2, y2);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &edge_paint, &stroke, Transform::identity(), None);
        }
    }

    let mut node_paint = Paint::default();
    node_paint.set_color_rgba8(NODE_COLOR.0, NODE_COLOR.1, NODE_COLOR.2, 255);
    node_paint.anti_alias = true;

    for &index in &zone.nodes {
        let (x, y) = to_tile(positions[index]);
        let mut pb = PathBuilder::new();
        pb.push_circle(x, y, NODE_RADIUS);
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, &node_paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    // Flip the grid row so tile filenames follow the manifest's image
    // coordinate convention (row 0 at the top).
    let row = geometry.rows - 1 - zone.row;
    let tile_path = level_dir.join(format!("{}_{}.png", zone.col, row));
    pixmap
        .save_png(&tile_path)
        .map_err(|e| RenderError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneGrid;

    fn render_to(dir: &Path, positions: &[Point], edges: &[(usize, usize)]) -> (usize, ZoneGrid) {
        let geometry = CanvasGeometry::from_positions(positions, 64, 1.0).unwrap();
        let grid = ZoneGrid::build(geometry, positions, edges);
        let rendered = render_base_tiles(&grid, positions, dir).unwrap();
        (rendered, grid)
    }

    #[test]
    fn renders_one_tile_for_a_single_node() {
        let dir = tempfile::tempdir().unwrap();
        let positions = vec![Point::new(0.0, 0.0)];
        let (rendered, grid) = render_to(dir.path(), &positions, &[]);

        assert_eq!(rendered, 1);
        let level = grid.geometry().max_level;
        let tile = dir.path().join(level.to_string()).join("0_0.png");
        assert!(tile.exists(), "expected {}", tile.display());
    }

    #[test]
    fn empty_zones_produce_no_files() {
        let dir = tempfile::tempdir().unwrap();
        // Two nodes in opposite corners of a multi-zone canvas, no edges:
        // zones between them stay untouched.
        let positions = vec![Point::new(0.0, 0.0), Point::new(300.0, 300.0)];
        let (rendered, grid) = render_to(dir.path(), &positions, &[]);

        assert_eq!(rendered, grid.active_zones());
        let level_dir = dir.path().join(grid.geometry().max_level.to_string());
        let files = std::fs::read_dir(level_dir).unwrap().count();
        assert_eq!(files, rendered);
        let total_cells = (grid.geometry().cols * grid.geometry().rows) as usize;
        assert!(rendered < total_cells, "sparse grid expected");
    }

    #[test]
    fn tile_rows_are_flipped_for_image_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        // Node near the top of the world lands in the highest-j zone, which
        // must be written as image row 0.
        let positions = vec![Point::new(0.0, 0.0), Point::new(10.0, 300.0)];
        let (_, grid) = render_to(dir.path(), &positions, &[]);

        let geometry = grid.geometry();
        let (col, row) = geometry.zone_index(positions[1]);
        assert_eq!(row, geometry.rows - 1);
        let tile = dir
            .path()
            .join(geometry.max_level.to_string())
            .join(format!("{col}_0.png"));
        assert!(tile.exists(), "top world zone should be image row 0");
    }

    #[test]
    fn rendered_tile_has_tile_size_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let positions = vec![Point::new(0.0, 0.0)];
        let (_, grid) = render_to(dir.path(), &positions, &[]);

        let level = grid.geometry().max_level;
        let tile = image::open(dir.path().join(level.to_string()).join("0_0.png")).unwrap();
        assert_eq!(tile.width(), 64);
        assert_eq!(tile.height(), 64);
    }
}
