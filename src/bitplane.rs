//! Separation of a grid into its high and low significance bit planes.

use crate::error::{Error, Result};
use crate::grid::{self, PixelGrid};

/// The two planes obtained by splitting a grid at a bit boundary.
#[derive(Debug, Clone)]
pub struct BitPlanes {
    /// High significance bits, `(value >> n) << n`.
    pub hsb: PixelGrid,
    /// Low significance bits, `value & ((1 << n) - 1)`.
    pub lsb: PixelGrid,
    /// Number of bits in the low plane.
    pub bit_depth: u8,
}

fn check_bit_depth(n: u8) -> Result<()> {
    if !(1..=8).contains(&n) {
        return Err(Error::InvalidBitDepth(n));
    }
    Ok(())
}

/// Split the grid such that the lowest `n` bits end up in the low plane.
///
/// Computations are done in `u16` so that `n == 8` yields an empty high plane instead of an
/// overflowing shift.
pub fn split(source: &PixelGrid, n: u8) -> Result<BitPlanes> {
    check_bit_depth(n)?;
    let mask = ((1u16 << n) - 1) as u8;
    let (width, height) = source.dimensions();
    let hsb = grid::from_fn(width, height, |row, col| {
        let v = grid::value(source, row, col) as u16;
        ((v >> n) << n) as u8
    });
    let lsb = grid::from_fn(width, height, |row, col| {
        grid::value(source, row, col) & mask
    });
    Ok(BitPlanes {
        hsb,
        lsb,
        bit_depth: n,
    })
}

/// Reassemble the source grid by OR-ing the planes.
pub fn reconstruct(hsb: &PixelGrid, lsb: &PixelGrid) -> Result<PixelGrid> {
    grid::ensure_same_dimensions(hsb, lsb)?;
    let (width, height) = hsb.dimensions();
    Ok(grid::from_fn(width, height, |row, col| {
        grid::value(hsb, row, col) | grid::value(lsb, row, col)
    }))
}

impl BitPlanes {
    pub fn reconstruct(&self) -> Result<PixelGrid> {
        reconstruct(&self.hsb, &self.lsb)
    }
}
