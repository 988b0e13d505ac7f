//! Spatial partitioning of the final layout into fixed-size pixel zones.
//!
//! The padded bounding box of the layout is scaled to a pixel canvas and cut
//! into a grid of square zones, one per finest-level tile. Zones are created
//! lazily on first touch and live for a single render pass.

use std::collections::HashMap;

use crate::geometry::{Point, Rect, segment_intersects_rect};

/// World-space padding used when every point coincides (degenerate bounding
/// box must not divide by zero).
const DEGENERATE_PADDING: f32 = 0.1;

/// Pixel-space geometry of the full canvas, derived once from the final
/// positions.
#[derive(Debug, Clone)]
pub struct CanvasGeometry {
    /// Padded bounding box in layout space.
    pub world: Rect,
    pub width_px: u32,
    pub height_px: u32,
    pub tile_size: u32,
    /// Zone grid dimensions at the finest level.
    pub cols: u32,
    pub rows: u32,
    /// Finest pyramid level; level 0 is the single root tile.
    pub max_level: u32,
}

impl CanvasGeometry {
    /// Compute the canvas from final positions. Returns `None` for an empty
    /// position set.
    pub fn from_positions(positions: &[Point], tile_size: u32, pixel_scale: f32) -> Option<Self> {
        if positions.is_empty() {
            return None;
        }

        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for p in positions {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let extent = (max_x - min_x).max(max_y - min_y);
        let padding = if extent > 0.0 {
            0.1 * extent
        } else {
            DEGENERATE_PADDING
        };
        let world = Rect::new(min_x - padding, min_y - padding, max_x + padding, max_y + padding);

        let width_px = (world.width() * pixel_scale).ceil().max(1.0) as u32;
        let height_px = (world.height() * pixel_scale).ceil().max(1.0) as u32;
        let cols = width_px.div_ceil(tile_size).max(1);
        let rows = height_px.div_ceil(tile_size).max(1);
        let max_level = (width_px.max(height_px) as f32).log2().ceil().max(0.0) as u32;

        Some(Self {
            world,
            width_px,
            height_px,
            tile_size,
            cols,
            rows,
            max_level,
        })
    }

    /// Grid cell containing a world position. Total: out-of-range pixels are
    /// clamped onto the grid, so every node lands in exactly one zone.
    pub fn zone_index(&self, p: Point) -> (u32, u32) {
        let px = (p.x - self.world.min_x) / self.world.width() * self.width_px as f32;
        let py = (p.y - self.world.min_y) / self.world.height() * self.height_px as f32;
        let i = ((px / self.tile_size as f32) as i64).clamp(0, self.cols as i64 - 1) as u32;
        let j = ((py / self.tile_size as f32) as i64).clamp(0, self.rows as i64 - 1) as u32;
        (i, j)
    }

    /// World-space rectangle covered by cell (i, j). Cell j counts upward in
    /// world space; the raster row flip happens at render time.
    pub fn zone_bounds(&self, i: u32, j: u32) -> Rect {
        let ts = self.tile_size as f32;
        let min_x =
            self.world.min_x + (i as f32 * ts / self.width_px as f32) * self.world.width();
        let max_x =
            self.world.min_x + ((i + 1) as f32 * ts / self.width_px as f32) * self.world.width();
        let min_y =
            self.world.min_y + (j as f32 * ts / self.height_px as f32) * self.world.height();
        let max_y =
            self.world.min_y + ((j + 1) as f32 * ts / self.height_px as f32) * self.world.height();
        Rect::new(min_x, min_y, max_x, max_y)
    }
}

/// One grid cell: owns the node indices and edge pairs assigned to it.
#[derive(Debug)]
pub struct Zone {
    pub col: u32,
    /// Grid row in world orientation (row 0 at the bottom).
    pub row: u32,
    pub bounds: Rect,
    pub nodes: Vec<usize>,
    pub edges: Vec<(usize, usize)>,
}

impl Zone {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Lazily-instantiated zone arena keyed by grid coordinate. Zones are never
/// deleted during a pass.
#[derive(Debug)]
pub struct ZoneGrid {
    geometry: CanvasGeometry,
    zones: HashMap<(u32, u32), Zone>,
}

impl ZoneGrid {
    /// Assign every node to its zone and every edge to each zone its segment
    /// passes through.
    pub fn build(
        geometry: CanvasGeometry,
        positions: &[Point],
        edges: &[(usize, usize)],
    ) -> Self {
        let mut grid = Self {
            geometry,
            zones: HashMap::new(),
        };

        for (index, &p) in positions.iter().enumerate() {
            let cell = grid.geometry.zone_index(p);
            grid.touch(cell).nodes.push(index);
        }

        for &(u, v) in edges {
            let a = positions[u];
            let b = positions[v];
            let (i1, j1) = grid.geometry.zone_index(a);
            let (i2, j2) = grid.geometry.zone_index(b);

            // Every cell in the rectangle spanned by the endpoint cells is a
            // candidate; the geometric test decides membership.
            for i in i1.min(i2)..=i1.max(i2) {
                for j in j1.min(j2)..=j1.max(j2) {
                    let zone = grid.touch((i, j));
                    let both_inside = zone.bounds.contains(a) && zone.bounds.contains(b);
                    if both_inside || segment_intersects_rect(a, b, &zone.bounds) {
                        zone.edges.push((u, v));
                    }
                }
            }
        }

        grid
    }

    fn touch(&mut self, (i, j): (u32, u32)) -> &mut Zone {
        let bounds = self.geometry.zone_bounds(i, j);
        self.zones.entry((i, j)).or_insert_with(|| Zone {
            col: i,
            row: j,
            bounds,
            nodes: Vec::new(),
            edges: Vec::new(),
        })
    }

    pub fn geometry(&self) -> &CanvasGeometry {
        &self.geometry
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    pub fn zone(&self, i: u32, j: u32) -> Option<&Zone> {
        self.zones.get(&(i, j))
    }

    /// Zones with at least one node or edge assigned.
    pub fn active_zones(&self) -> usize {
        self.zones.values().filter(|z| !z.is_empty()).count()
    }
}
