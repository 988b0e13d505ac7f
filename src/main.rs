use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use graphzoom::layout::LayoutConfig;
use graphzoom::pipeline::{self, RenderConfig};
use graphzoom::source::JsonGraphSource;

/// Lay out a node-link graph and render it as a deep-zoom tile pyramid.
#[derive(Parser, Debug)]
#[command(name = "graphzoom")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Graph source file (JSON with nodes and edges)
    source: PathBuf,

    /// Output base path: tiles land in `{base}_files/` next to `{base}.dzi`
    output: PathBuf,

    /// Iteration budget for the force simulation (default scales with graph size)
    #[arg(long)]
    iterations: Option<usize>,

    /// Repulsive force multiplier
    #[arg(long, default_value_t = 1.0)]
    repulsion: f32,

    /// Attractive force multiplier
    #[arg(long, default_value_t = 1.0)]
    attraction: f32,

    /// Tile edge length in pixels
    #[arg(long, default_value_t = 256, value_parser = clap::value_parser!(u32).range(1..))]
    tile_size: u32,

    /// Canvas pixels per world unit
    #[arg(long, default_value_t = 10.0)]
    pixel_scale: f32,

    /// Seed for random initial node placement
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut source = JsonGraphSource::open(&cli.source)?;
    let layout = LayoutConfig {
        repulsion: cli.repulsion,
        attraction: cli.attraction,
        iterations: cli.iterations,
        seed: cli.seed,
    };
    let render = RenderConfig {
        tile_size: cli.tile_size,
        pixel_scale: cli.pixel_scale,
    };

    let summary = pipeline::run(&mut source, &cli.output, layout, render)?;
    println!(
        "Rendered {} nodes / {} edges into {} zones ({}x{} px, max level {})",
        summary.nodes,
        summary.edges,
        summary.active_zones,
        summary.canvas_px.0,
        summary.canvas_px.1,
        summary.max_level
    );

    Ok(())
}
