//! graphzoom - turns a node-link graph into an explorable deep-zoom visualization.
//!
//! The pipeline computes a parallel force-directed 2D layout, partitions the
//! result into fixed-size pixel zones, rasterizes each zone into an image tile,
//! and builds a multi-resolution pyramid with a deep-zoom manifest on top.

pub mod geometry;
pub mod graph;
pub mod layout;
pub mod manifest;
pub mod pipeline;
pub mod pyramid;
pub mod render;
pub mod source;
pub mod zones;
