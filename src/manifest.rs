//! Deep-zoom (DZI) descriptor output.
//!
//! The manifest is the minimal descriptor a generic deep-zoom viewer needs to
//! request tiles by (level, column, row): canvas pixel size, tile size, image
//! format, and zero inter-tile overlap.

use std::fs;
use std::path::Path;

/// Deep-zoom descriptor for a rendered pyramid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub width_px: u32,
    pub height_px: u32,
    pub tile_size: u32,
}

impl Manifest {
    pub fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
       Format="png"
       Overlap="0"
       TileSize="{tile_size}">
    <Size Height="{height}" Width="{width}"/>
</Image>
"#,
            tile_size = self.tile_size,
            height = self.height_px,
            width = self.width_px,
        )
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, self.to_xml())
    }
}
