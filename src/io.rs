//! Persistence of grids and side information between phases.
//!
//! Grids are always written as PNG so that pixel values round-trip exactly. Loading accepts any
//! format the image crate decodes and converts it to a single 8 bit channel.

use crate::algorithm::SideInfo;
use crate::error::{Error, Result};
use crate::grid::PixelGrid;
use std::path::Path;

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Load a grid, converting colour images to luma.
pub fn load_grid(path: &Path) -> Result<PixelGrid> {
    ensure_exists(path)?;
    Ok(image::open(path)?.into_luma8())
}

/// Save the grid as a PNG, creating parent directories as needed.
pub fn save_grid(path: &Path, grid: &PixelGrid) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    grid.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

pub fn load_side_info(path: &Path) -> Result<SideInfo> {
    ensure_exists(path)?;
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_side_info(path: &Path, side_info: &SideInfo) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(side_info)?)?;
    Ok(())
}
