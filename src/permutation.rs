//! Keyed scrambling of block positions.
//!
//! The row-major list of block indices is shuffled with a Fisher-Yates shuffle driven by a
//! [`ChaCha8Rng`] seeded solely from the key. Position `p` in scan order of the scrambled grid
//! receives the block that was originally at `order[p]`. Unscrambling regenerates the same order
//! from the same key and moves every block back.
//!
//! The shuffle draws `u32` ranges rather than `usize` ranges, so a given key produces the same
//! permutation on 32 bit and 64 bit targets.
//!
//! A wrong key is not detected; it silently produces a differently scrambled grid.

use crate::error::{Error, Result};
use crate::grid::{self, BlockIndex, PixelGrid};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Bijection over the block positions of a grid of fixed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermutationMap {
    width: u32,
    height: u32,
    block_size: u32,
    /// Blocks in row-major order.
    indices: Vec<BlockIndex>,
    /// `order[p]` is the index into `indices` of the block placed at position `p`.
    order: Vec<usize>,
}

impl PermutationMap {
    /// Build the map for a grid of the given dimensions.
    pub fn new(width: u32, height: u32, block_size: u32, key: u64) -> Result<Self> {
        grid::ensure_tileable(width, height, block_size)?;
        let indices = grid::block_indices(width, height, block_size);
        let mut order: Vec<usize> = (0..indices.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(key);
        for i in (1..order.len()).rev() {
            let j = rng.gen_range(0..=(i as u32)) as usize;
            order.swap(i, j);
        }
        Ok(PermutationMap {
            width,
            height,
            block_size,
            indices,
            order,
        })
    }

    /// Build the map matching the dimensions of this grid.
    pub fn for_grid(grid: &PixelGrid, block_size: u32, key: u64) -> Result<Self> {
        let (width, height) = grid.dimensions();
        PermutationMap::new(width, height, block_size, key)
    }

    pub fn block_count(&self) -> usize {
        self.indices.len()
    }

    /// Block that lands at scan position `p` after scrambling.
    pub fn source_of(&self, p: usize) -> BlockIndex {
        self.indices[self.order[p]]
    }

    fn check(&self, grid: &PixelGrid) -> Result<()> {
        let (width, height) = grid.dimensions();
        if (width, height) != (self.width, self.height) {
            return Err(Error::DimensionMismatch {
                expected: (self.width, self.height),
                found: (width, height),
            });
        }
        Ok(())
    }

    /// Move every block to its scrambled position.
    pub fn scramble(&self, source: &PixelGrid) -> Result<PixelGrid> {
        self.check(source)?;
        let mut out = PixelGrid::new(self.width, self.height);
        for (p, &src) in self.order.iter().enumerate() {
            copy_block(source, self.indices[src], &mut out, self.indices[p], self.block_size);
        }
        Ok(out)
    }

    /// Move every block back to its original position.
    pub fn unscramble(&self, scrambled: &PixelGrid) -> Result<PixelGrid> {
        self.check(scrambled)?;
        let mut out = PixelGrid::new(self.width, self.height);
        for (p, &src) in self.order.iter().enumerate() {
            copy_block(scrambled, self.indices[p], &mut out, self.indices[src], self.block_size);
        }
        Ok(out)
    }
}

fn copy_block(
    from: &PixelGrid,
    from_block: BlockIndex,
    to: &mut PixelGrid,
    to_block: BlockIndex,
    block_size: u32,
) {
    let (from_row, from_col) = from_block.origin(block_size);
    let (to_row, to_col) = to_block.origin(block_size);
    for dr in 0..block_size {
        for dc in 0..block_size {
            let v = grid::value(from, from_row + dr, from_col + dc);
            grid::set_value(to, to_row + dr, to_col + dc, v);
        }
    }
}

/// Scramble the blocks of `source` under `key`.
pub fn scramble(source: &PixelGrid, block_size: u32, key: u64) -> Result<PixelGrid> {
    PermutationMap::for_grid(source, block_size, key)?.scramble(source)
}

/// Invert [`scramble`]; `key` must be the key used to scramble.
pub fn unscramble(scrambled: &PixelGrid, block_size: u32, key: u64) -> Result<PixelGrid> {
    PermutationMap::for_grid(scrambled, block_size, key)?.unscramble(scrambled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_is_bijection() {
        let map = PermutationMap::new(8, 8, 2, 1234).unwrap();
        let mut seen = map.order.clone();
        seen.sort();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_map_reproducible_from_key() {
        let a = PermutationMap::new(16, 8, 2, 77).unwrap();
        let b = PermutationMap::new(16, 8, 2, 77).unwrap();
        let c = PermutationMap::new(16, 8, 2, 78).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.order, c.order);
    }

    #[test]
    fn test_block_moves_as_a_whole() {
        let source = grid::from_fn(8, 8, |row, col| ((row / 2) * 4 + col / 2) as u8);
        let map = PermutationMap::for_grid(&source, 2, 5).unwrap();
        let scrambled = map.scramble(&source).unwrap();
        for p in 0..map.block_count() {
            let src = map.source_of(p);
            let dst = map.indices[p];
            let (row, col) = dst.origin(2);
            let expected = (src.row * 4 + src.col) as u8;
            for dr in 0..2 {
                for dc in 0..2 {
                    assert_eq!(grid::value(&scrambled, row + dr, col + dc), expected);
                }
            }
        }
        assert_eq!(map.unscramble(&scrambled).unwrap(), source);
    }

    #[test]
    fn test_rejects_untileable() {
        let source = grid::filled(6, 5, 1);
        assert!(matches!(
            scramble(&source, 2, 0),
            Err(Error::BlockSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_other_dimensions() {
        let map = PermutationMap::new(4, 4, 2, 0).unwrap();
        let other = grid::filled(8, 4, 1);
        assert!(matches!(
            map.scramble(&other),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
