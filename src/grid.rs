//! The pixel grid every stage operates on, and block addressing within it.
//!
//! A [`PixelGrid`] is a plain [`image::GrayImage`]; single channel, 8 bits per pixel, row-major.
//! Throughout this crate positions are written as `(row, col)`, which maps onto the image crate's
//! `(x, y) = (col, row)` convention.

use crate::error::{Error, Result};
use image::Luma;

/// Single channel 8 bit grid of pixel values.
pub type PixelGrid = image::GrayImage;

/// Create a grid where each pixel is given by the function of `(row, col)`.
pub fn from_fn<F: FnMut(u32, u32) -> u8>(width: u32, height: u32, mut f: F) -> PixelGrid {
    PixelGrid::from_fn(width, height, |x, y| Luma([f(y, x)]))
}

/// Create a grid with every pixel set to `value`.
pub fn filled(width: u32, height: u32, value: u8) -> PixelGrid {
    PixelGrid::from_pixel(width, height, Luma([value]))
}

/// Read the pixel at `(row, col)`.
#[inline]
pub fn value(grid: &PixelGrid, row: u32, col: u32) -> u8 {
    grid.get_pixel(col, row).0[0]
}

/// Write the pixel at `(row, col)`.
#[inline]
pub fn set_value(grid: &mut PixelGrid, row: u32, col: u32, v: u8) {
    grid.get_pixel_mut(col, row).0[0] = v;
}

/// Fail if the two grids do not share dimensions.
pub fn ensure_same_dimensions(expected: &PixelGrid, found: &PixelGrid) -> Result<()> {
    if expected.dimensions() != found.dimensions() {
        return Err(Error::DimensionMismatch {
            expected: expected.dimensions(),
            found: found.dimensions(),
        });
    }
    Ok(())
}

/// Fail unless both dimensions are a non-zero multiple of `block_size`.
pub fn ensure_tileable(width: u32, height: u32, block_size: u32) -> Result<()> {
    if block_size == 0 || width % block_size != 0 || height % block_size != 0 {
        return Err(Error::BlockSizeMismatch {
            width,
            height,
            block_size,
        });
    }
    Ok(())
}

/// Address of a square tile within a grid, counted in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockIndex {
    pub row: u32,
    pub col: u32,
}

impl BlockIndex {
    /// Pixel coordinate `(row, col)` of the top left corner of this block.
    pub fn origin(&self, block_size: u32) -> (u32, u32) {
        (self.row * block_size, self.col * block_size)
    }
}

/// All block indices of a grid in row-major scan order.
pub fn block_indices(width: u32, height: u32, block_size: u32) -> Vec<BlockIndex> {
    let blocks_wide = width / block_size;
    let blocks_tall = height / block_size;
    (0..blocks_tall)
        .flat_map(|row| (0..blocks_wide).map(move |col| BlockIndex { row, col }))
        .collect()
}
