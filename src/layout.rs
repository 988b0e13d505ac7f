//! Parallel Fruchterman-Reingold force-directed layout.
//!
//! Connected nodes attract, all node pairs repel. Within one iteration every
//! worker reads the same frozen position snapshot, so the repulsive pass is
//! deterministic and order-independent; the attractive pass and the position
//! update run single-threaded once the workers have been gathered.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::geometry::Point;
use crate::graph::AdjacencyIndex;

/// Squared distance below which a node pair is treated as coincident and
/// skipped by the repulsive pass.
const MIN_REPULSION_DIST_SQ: f32 = 1e-9;

/// Distance floor for the attractive pass; keeps coincident endpoints stable.
const MIN_ATTRACTION_DIST: f32 = 0.01;

/// Graphs under this many nodes get the short iteration budget.
const SMALL_GRAPH_THRESHOLD: usize = 50;

/// Half-extent of the square in which missing positions are seeded.
const SEED_DOMAIN: f32 = 10.0;

/// Process-wide layout tunables, immutable once the engine is built.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Repulsive force multiplier.
    pub repulsion: f32,
    /// Attractive force multiplier.
    pub attraction: f32,
    /// Iteration budget; `None` picks 20 or 50 by graph size.
    pub iterations: Option<usize>,
    /// Seed for random initial placement of nodes without a stored position.
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            repulsion: 1.0,
            attraction: 1.0,
            iterations: None,
            seed: 42,
        }
    }
}

/// The live position array, indexed by node index.
///
/// During an iteration all workers read the frozen slice; the coordinator
/// commits displacements strictly between parallel sections. Reads and writes
/// never overlap in time, so no locking is involved.
#[derive(Debug, Clone)]
pub struct PositionBuffer {
    coords: Vec<Point>,
}

impl PositionBuffer {
    pub fn new(coords: Vec<Point>) -> Self {
        Self { coords }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// The snapshot workers read for the current iteration.
    pub fn frozen(&self) -> &[Point] {
        &self.coords
    }

    /// Apply per-node forces, capping each displacement at `temperature`.
    ///
    /// Returns the total (uncapped) displacement magnitude, the quantity the
    /// convergence check watches.
    pub fn commit(&mut self, forces: &[Point], temperature: f32) -> f32 {
        let mut total = 0.0;
        for (pos, force) in self.coords.iter_mut().zip(forces) {
            let magnitude = (force.x * force.x + force.y * force.y).sqrt();
            total += magnitude;
            if magnitude > 0.0 {
                let scale = magnitude.min(temperature) / magnitude;
                pos.x += force.x * scale;
                pos.y += force.y * scale;
            }
        }
        total
    }

    pub fn into_coords(self) -> Vec<Point> {
        self.coords
    }
}

/// One-shot force simulation over a fixed node set.
pub struct LayoutEngine {
    config: LayoutConfig,
    buffer: PositionBuffer,
    /// Ideal edge length k, derived from the layout area.
    ideal_length: f32,
    initial_temp: f32,
    iterations: usize,
}

impl LayoutEngine {
    /// Build the engine from initial positions in node-index order. Nodes
    /// without a stored position are seeded uniformly at random; the seed is
    /// fixed, so identical inputs produce identical layouts.
    pub fn new(initial: Vec<Option<Point>>, config: LayoutConfig) -> Self {
        let n = initial.len();
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let coords = initial
            .into_iter()
            .map(|p| {
                p.unwrap_or_else(|| {
                    Point::new(
                        rng.gen_range(-SEED_DOMAIN..SEED_DOMAIN),
                        rng.gen_range(-SEED_DOMAIN..SEED_DOMAIN),
                    )
                })
            })
            .collect();

        let area = 4.0 * (n as f32) * (n as f32);
        let ideal_length = if n > 0 { (area / n as f32).sqrt() } else { 1.0 };
        let initial_temp = area.sqrt() * 0.1;
        let iterations = config.iterations.unwrap_or(if n < SMALL_GRAPH_THRESHOLD {
            20
        } else {
            50
        });

        Self {
            config,
            buffer: PositionBuffer::new(coords),
            ideal_length,
            initial_temp,
            iterations,
        }
    }

    /// Run the simulation to completion and return final positions in node
    /// order. An empty graph is a no-op.
    pub fn run(mut self, adjacency: &AdjacencyIndex) -> Vec<Point> {
        let n = self.buffer.len();
        if n == 0 {
            return Vec::new();
        }

        for iteration in 0..self.iterations {
            // Linear annealing toward zero across the budget.
            let temperature =
                self.initial_temp * (1.0 - iteration as f32 / self.iterations as f32);
            let total_displacement = self.step(adjacency, temperature);

            if total_displacement < 0.01 * n as f32 {
                debug!(iteration, "layout converged early");
                break;
            }
        }

        self.buffer.into_coords()
    }

    fn step(&mut self, adjacency: &AdjacencyIndex, temperature: f32) -> f32 {
        let k = self.ideal_length;
        let repulsion = self.config.repulsion;
        let attraction = self.config.attraction;

        let forces = {
            let snapshot = self.buffer.frozen();

            // Repulsion: each worker computes its contiguous index range
            // against the full frozen snapshot.
            let mut forces: Vec<Point> = (0..snapshot.len())
                .into_par_iter()
                .map(|i| repulsive_force(i, snapshot, k, repulsion))
                .collect();

            // Attraction merges single-threaded after the gather barrier,
            // once per edge occurrence (Hooke's-law-like).
            for &(u, v) in adjacency.edge_pairs() {
                let dx = snapshot[u].x - snapshot[v].x;
                let dy = snapshot[u].y - snapshot[v].y;
                let dist = (dx * dx + dy * dy).sqrt().max(MIN_ATTRACTION_DIST);
                let f = dist * dist / k * attraction;
                let (ux, uy) = (dx / dist, dy / dist);
                forces[u].x -= ux * f;
                forces[u].y -= uy * f;
                forces[v].x += ux * f;
                forces[v].y += uy * f;
            }

            forces
        };

        self.buffer.commit(&forces, temperature)
    }
}

/// Total repulsive force on node `i` from every other node: k²/d per pair,
/// directed away from the neighbor. Coincident pairs are skipped.
fn repulsive_force(i: usize, snapshot: &[Point], k: f32, multiplier: f32) -> Point {
    let p = snapshot[i];
    let mut fx = 0.0;
    let mut fy = 0.0;
    for (j, q) in snapshot.iter().enumerate() {
        if j == i {
            continue;
        }
        let dx = p.x - q.x;
        let dy = p.y - q.y;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq <= MIN_REPULSION_DIST_SQ {
            continue;
        }
        let dist = dist_sq.sqrt();
        let f = k * k / dist * multiplier;
        fx += dx * (f / dist);
        fy += dy * (f / dist);
    }
    Point::new(fx, fy)
}
