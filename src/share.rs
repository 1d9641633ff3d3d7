//! Two-out-of-two additive secret sharing of a grid, modulo 256.
//!
//! The first share is drawn uniformly at random per pixel, independent of the secret. The second
//! share is the complement such that `(share1 + share2) mod 256` equals the secret. Recombination
//! needs both shares and nothing else.

use crate::bitplane::BitPlanes;
use crate::error::Result;
use crate::grid::{self, PixelGrid};
use rand::Rng;

/// A pair of shares of one grid.
#[derive(Debug, Clone)]
pub struct Shares {
    pub share1: PixelGrid,
    pub share2: PixelGrid,
}

/// Produce two additive shares of `hsb + lsb`.
///
/// Since the planes cover disjoint bit ranges, `hsb + lsb` is the original pixel value.
pub fn generate_shares<R: Rng + ?Sized>(
    hsb: &PixelGrid,
    lsb: &PixelGrid,
    rng: &mut R,
) -> Result<Shares> {
    grid::ensure_same_dimensions(hsb, lsb)?;
    let (width, height) = hsb.dimensions();
    let share1 = grid::from_fn(width, height, |_, _| rng.gen::<u8>());
    let share2 = grid::from_fn(width, height, |row, col| {
        let secret = grid::value(hsb, row, col).wrapping_add(grid::value(lsb, row, col));
        secret.wrapping_sub(grid::value(&share1, row, col))
    });
    Ok(Shares { share1, share2 })
}

impl BitPlanes {
    /// Share the grid these planes were split from.
    pub fn share<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Shares> {
        generate_shares(&self.hsb, &self.lsb, rng)
    }
}

/// Add the shares modulo 256.
pub fn combine_shares(share1: &PixelGrid, share2: &PixelGrid) -> Result<PixelGrid> {
    grid::ensure_same_dimensions(share1, share2)?;
    let (width, height) = share1.dimensions();
    Ok(grid::from_fn(width, height, |row, col| {
        grid::value(share1, row, col).wrapping_add(grid::value(share2, row, col))
    }))
}

impl Shares {
    pub fn combine(&self) -> Result<PixelGrid> {
        combine_shares(&self.share1, &self.share2)
    }
}
