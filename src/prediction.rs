//! Per-block linear prediction and the histogram of prediction errors.
//!
//! Each 2x2 block `[[a, b], [c, d]]` predicts its bottom right pixel as `(a + b + c) / 3`, using
//! integer truncation. The prediction error is `d - predicted`. Blocks are visited with the row
//! `i` stepping over `0, 2, .., height - 2` and, for every row, the column `j` stepping over
//! `0, 2, .., width - 2`. Embedding and extraction both rely on this exact order.

use crate::grid::{self, PixelGrid};

/// Smallest possible prediction error, `0 - 255`.
pub const MIN_ERROR: i32 = -255;
/// Largest possible prediction error, `255 - 0`.
pub const MAX_ERROR: i32 = 255;
const HISTOGRAM_BINS: usize = (MAX_ERROR - MIN_ERROR + 1) as usize;

/// Prediction result for the bottom right pixel of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionErrorRecord {
    /// Row of the predicted (bottom right) pixel.
    pub row: u32,
    /// Column of the predicted (bottom right) pixel.
    pub col: u32,
    pub predicted: i32,
    pub actual: i32,
    pub error: i32,
}

/// Predict the bottom right pixel from the other three pixels of the block.
#[inline]
pub fn predict(a: u8, b: u8, c: u8) -> i32 {
    (a as i32 + b as i32 + c as i32) / 3
}

/// Compute the prediction record for the block whose top left pixel is at `(i, j)`.
pub fn block_record(image: &PixelGrid, i: u32, j: u32) -> PredictionErrorRecord {
    let a = grid::value(image, i, j);
    let b = grid::value(image, i, j + 1);
    let c = grid::value(image, i + 1, j);
    let d = grid::value(image, i + 1, j + 1) as i32;
    let predicted = predict(a, b, c);
    PredictionErrorRecord {
        row: i + 1,
        col: j + 1,
        predicted,
        actual: d,
        error: d - predicted,
    }
}

/// Iterate over all complete 2x2 blocks in traversal order.
///
/// A trailing odd row or column is never visited.
pub fn scan(image: &PixelGrid) -> impl Iterator<Item = PredictionErrorRecord> + '_ {
    let (width, height) = image.dimensions();
    (0..height.saturating_sub(1))
        .step_by(2)
        .flat_map(move |i| {
            (0..width.saturating_sub(1))
                .step_by(2)
                .map(move |j| block_record(image, i, j))
        })
}

/// Number of complete 2x2 blocks visited by [`scan`].
pub fn block_count(image: &PixelGrid) -> usize {
    let (width, height) = image.dimensions();
    (width / 2) as usize * (height / 2) as usize
}

/// Occurrence count of each prediction error over one traversal.
#[derive(Clone)]
pub struct ErrorHistogram {
    counts: [usize; HISTOGRAM_BINS],
    /// Number of distinct errors seen before each bin was first filled.
    first_seen: [u32; HISTOGRAM_BINS],
    distinct: u32,
    total: usize,
}

impl std::fmt::Debug for ErrorHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only the populated bins, the full array is mostly zeros.
        f.debug_map()
            .entries(self.iter().filter(|(_, count)| *count != 0))
            .finish()
    }
}

impl Default for ErrorHistogram {
    fn default() -> Self {
        ErrorHistogram {
            counts: [0; HISTOGRAM_BINS],
            first_seen: [0; HISTOGRAM_BINS],
            distinct: 0,
            total: 0,
        }
    }
}

impl ErrorHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Histogram over every block of the grid.
    pub fn from_grid(image: &PixelGrid) -> Self {
        let mut histogram = Self::new();
        for record in scan(image) {
            histogram.add(record.error);
        }
        histogram
    }

    pub fn add(&mut self, error: i32) {
        let bin = Self::bin(error);
        if self.counts[bin] == 0 {
            self.first_seen[bin] = self.distinct;
            self.distinct += 1;
        }
        self.counts[bin] += 1;
        self.total += 1;
    }

    pub fn count(&self, error: i32) -> usize {
        if !(MIN_ERROR..=MAX_ERROR).contains(&error) {
            return 0;
        }
        self.counts[Self::bin(error)]
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Iterate over `(error, count)` from the lowest error upwards.
    pub fn iter(&self) -> impl Iterator<Item = (i32, usize)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(bin, count)| (bin as i32 + MIN_ERROR, *count))
    }

    /// Most frequent error; ties go to the error that was added first. `None` for an empty
    /// histogram.
    pub fn mode(&self) -> Option<(i32, usize)> {
        self.iter()
            .filter(|(_, count)| *count != 0)
            .max_by(|(a, count_a), (b, count_b)| {
                let earlier = self.first_seen[Self::bin(*b)].cmp(&self.first_seen[Self::bin(*a)]);
                count_a.cmp(count_b).then(earlier)
            })
    }

    fn bin(error: i32) -> usize {
        (error - MIN_ERROR) as usize
    }
}
