#![allow(dead_code)]
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use reversible_share_watermarking as rsw;
use rsw::grid::{self, PixelGrid};

/// Grid of uniformly random pixels, reproducible from the seed.
pub fn generate_fixed_random_grid(seed: u64, width: u32, height: u32) -> PixelGrid {
    let mut generator = ChaCha8Rng::seed_from_u64(seed);
    grid::from_fn(width, height, |_, _| generator.gen())
}

/// Smooth gradient with a little noise, values stay well away from 0 and 255.
pub fn generate_smooth_grid(seed: u64, width: u32, height: u32) -> PixelGrid {
    let mut generator = ChaCha8Rng::seed_from_u64(seed);
    grid::from_fn(width, height, |row, col| {
        let base = 64 + (row + col) / 4;
        (base + generator.gen_range(0..3)) as u8
    })
}

/// Random bitstream, reproducible from the seed.
pub fn generate_fixed_bits(seed: u64, length: usize) -> Vec<bool> {
    let mut generator = ChaCha8Rng::seed_from_u64(seed);
    (0..length).map(|_| generator.gen()).collect()
}
