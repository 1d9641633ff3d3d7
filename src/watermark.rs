//! Conversion between binary watermark images and bitstreams.

use crate::algorithm::Bitstream;
use crate::grid::{self, PixelGrid};

/// Pixels strictly above this value read as a one bit.
pub const THRESHOLD: u8 = 127;

/// Threshold the watermark image and flatten it in row-major order.
pub fn bits_from_image(watermark: &PixelGrid) -> Bitstream {
    watermark.pixels().map(|p| p.0[0] > THRESHOLD).collect()
}

/// Side of the smallest square that holds `n` bits.
pub fn square_side(n: usize) -> u32 {
    let mut side = (n as f64).sqrt() as usize;
    while side * side < n {
        side += 1;
    }
    side as u32
}

/// Lay the bits out row-major in a square image; ones become 255, zeros and padding 0.
pub fn bits_to_image(bits: &[bool]) -> PixelGrid {
    let side = square_side(bits.len());
    grid::from_fn(side, side, |row, col| {
        let idx = (row * side + col) as usize;
        match bits.get(idx) {
            Some(true) => 255,
            _ => 0,
        }
    })
}
