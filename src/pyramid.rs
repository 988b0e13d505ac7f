//! Bottom-up construction of the coarser pyramid levels.
//!
//! Level L is built from level L+1: up to four children paste into a canvas
//! twice the tile size, which is then downsampled 2x. Tiles within one level
//! build in parallel; levels are strictly sequential because each reads the
//! files the previous pass wrote.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::render::RenderError;

/// Build levels `max_level - 1` down to 0 from the finest grid of
/// `cols` x `rows` tiles under `out_dir`. Level 0 ends as a single root tile.
pub fn build_levels(
    out_dir: &Path,
    max_level: u32,
    cols: u32,
    rows: u32,
    tile_size: u32,
) -> Result<(), RenderError> {
    let mut cols = cols;
    let mut rows = rows;

    for level in (0..max_level).rev() {
        cols = cols.div_ceil(2);
        rows = rows.div_ceil(2);
        let level_dir = out_dir.join(level.to_string());
        std::fs::create_dir_all(&level_dir)?;

        let tiles: Vec<(u32, u32)> = (0..cols)
            .flat_map(|i| (0..rows).map(move |j| (i, j)))
            .collect();

        let built: usize = tiles
            .par_iter()
            .map(|&(i, j)| match build_tile(out_dir, level, i, j, tile_size) {
                Ok(true) => 1,
                Ok(false) => 0,
                Err(err) => {
                    warn!(level, col = i, row = j, error = %err, "skipping pyramid tile");
                    0
                }
            })
            .sum();

        debug!(level, cols, rows, built, "pyramid level complete");
    }

    Ok(())
}

/// Composite the up-to-four children of tile (i, j) and downsample.
///
/// Returns `false` when every child is absent: sparsity propagates upward and
/// the tile is never materialized as a blank placeholder.
fn build_tile(
    out_dir: &Path,
    level: u32,
    i: u32,
    j: u32,
    tile_size: u32,
) -> Result<bool, RenderError> {
    let child_dir = out_dir.join((level + 1).to_string());
    let mut canvas = RgbaImage::from_pixel(tile_size * 2, tile_size * 2, Rgba([255, 255, 255, 255]));

    let children = [
        (2 * i, 2 * j, 0, 0),
        (2 * i + 1, 2 * j, tile_size, 0),
        (2 * i, 2 * j + 1, 0, tile_size),
        (2 * i + 1, 2 * j + 1, tile_size, tile_size),
    ];

    let mut has_content = false;
    for (child_col, child_row, x, y) in children {
        let child_path = child_dir.join(format!("{child_col}_{child_row}.png"));
        if !child_path.exists() {
            continue;
        }
        match image::open(&child_path) {
            Ok(child) => {
                imageops::replace(&mut canvas, &child.to_rgba8(), i64::from(x), i64::from(y));
                has_content = true;
            }
            // An unreadable child counts as absent.
            Err(err) => {
                warn!(path = %child_path.display(), error = %err, "ignoring unreadable child tile");
            }
        }
    }

    if !has_content {
        return Ok(false);
    }

    let tile = imageops::resize(&canvas, tile_size, tile_size, FilterType::Lanczos3);
    let tile_path = out_dir.join(level.to_string()).join(format!("{i}_{j}.png"));
    tile.save(&tile_path)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(true)
}
