//! Error type shared by every stage of the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can be emitted by the splitting, sharing, scrambling, embedding and persistence
/// steps.
#[derive(Debug, Error)]
pub enum Error {
    /// The bit boundary must lie within a byte.
    #[error("bit depth {0} outside of the valid range 1..=8")]
    InvalidBitDepth(u8),

    /// Grid dimensions must be multiples of the block size, which itself must be non-zero.
    #[error("grid of {width}x{height} can not be tiled by blocks of size {block_size}")]
    BlockSizeMismatch {
        width: u32,
        height: u32,
        block_size: u32,
    },

    /// Two grids that take part in one operation have different shapes.
    #[error("grid dimensions {found:?} do not match expected {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    /// The grid does not contain a single complete 2x2 block.
    #[error("grid holds no complete 2x2 block, no prediction errors available")]
    NoBlocks,

    /// The grid is smaller than the window a metric is computed over.
    #[error("grid of {width}x{height} is smaller than the {window}x{window} window")]
    TooSmall { width: u32, height: u32, window: u32 },

    /// Two bitstreams that must be compared element-wise differ in length.
    #[error("bitstream length {found} does not match expected length {expected}")]
    LengthMismatch { expected: usize, found: usize },

    /// An input file is not present.
    #[error("no file found at {0:?}")]
    NotFound(PathBuf),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
