//! Reversible embedding and extraction through prediction-error expansion with histogram shifting.
//!
//! The main steps in the embedding are:
//! - Traverse the 2x2 blocks and compute the prediction error of each bottom right pixel, see
//!   [`crate::prediction`].
//! - Build the histogram of these errors and pick the admission threshold `t`; the histogram mode
//!   for the exact-match policy, `0` for the adaptive policy.
//! - Traverse again. An admissible block takes the next bit as `d' = d + bit`, a block with an
//!   error above the admissible window is shifted by `d' = d + 1`, all others stay put.
//! - Stop as soon as the last bit is consumed, the remainder of the grid is left untouched.
//!
//! Extraction repeats the traversal on the marked grid. A marked error of `t` reads as bit 0, an
//! error of `t + 1` as bit 1 and errors above the window were shifted. Recovery subtracts the
//! bits and undoes the shifts, restoring the grid exactly as long as no pixel was clipped at 0 or
//! 255 during embedding. When the bitstream did not fit, the embedding shifted blocks up to the end
//! of the grid and the extraction keeps collecting shifted blocks after the last bit.
//!
//! The adaptive policy admits errors `0` and `1` and therefore can not be undone exactly for
//! blocks that had an error of `1`; it trades exactness for capacity.
//!
//! Both engines compute a list of [`Edit`] values against the input grid and apply those to a
//! copy, the input is never modified.

use crate::error::{Error, Result};
use crate::grid::{self, PixelGrid};
use crate::prediction::{self, ErrorHistogram, PredictionErrorRecord};
use crate::util::clip;
use serde::{Deserialize, Serialize};

/// Ordered sequence of watermark bits.
pub type Bitstream = Vec<bool>;

/// Default number of bits extracted when no side information is available.
pub const DEFAULT_MAX_BITS: usize = 1024;

/// How the admission threshold is chosen during embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Exact-match; embed only at the most frequent prediction error.
    Mode,
    /// Exact-match at a caller chosen error value.
    Fixed(i32),
    /// Admit errors `0` and `1`, shift everything above.
    Adaptive,
}

/// The family an embedding belongs to, persisted with the side information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    ExactMatch,
    Adaptive,
}

/// Resolved admission rule; admissible errors are `threshold..threshold + window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub kind: PolicyKind,
    pub threshold: i32,
}

impl Policy {
    pub fn exact_match(threshold: i32) -> Self {
        Policy {
            kind: PolicyKind::ExactMatch,
            threshold,
        }
    }

    pub fn adaptive() -> Self {
        Policy {
            kind: PolicyKind::Adaptive,
            threshold: 0,
        }
    }

    /// Number of consecutive error values admitted for embedding.
    pub fn window(&self) -> i32 {
        match self.kind {
            PolicyKind::ExactMatch => 1,
            PolicyKind::Adaptive => 2,
        }
    }

    /// Whether a block with this prediction error carries a bit.
    pub fn is_admissible(&self, error: i32) -> bool {
        error >= self.threshold && error < self.threshold + self.window()
    }

    /// Whether a block with this prediction error is shifted to make room.
    pub fn is_shifted(&self, error: i32) -> bool {
        error >= self.threshold + self.window()
    }
}

/// Side information needed by the extractor, carried next to the marked grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideInfo {
    pub policy: PolicyKind,
    /// Error value that reads as bit 0.
    pub threshold: i32,
    /// Length of the bitstream handed to the embedder.
    pub requested: usize,
    /// Number of bits that actually went into the grid.
    pub embedded: usize,
}

impl SideInfo {
    /// Side information that assumes an exact-match embedding at error `0`.
    ///
    /// This is only correct if the histogram mode of the embedded grid was `0`, use it when the
    /// real side information was lost.
    pub fn legacy(max_bits: usize) -> Self {
        SideInfo {
            policy: PolicyKind::ExactMatch,
            threshold: 0,
            requested: max_bits,
            embedded: max_bits,
        }
    }

    pub fn policy(&self) -> Policy {
        Policy {
            kind: self.policy,
            threshold: self.threshold,
        }
    }

    /// True if the bitstream did not fit into the grid.
    pub fn is_truncated(&self) -> bool {
        self.embedded < self.requested
    }
}

/// A change of a single pixel value, applied with clipping to `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub row: u32,
    pub col: u32,
    pub delta: i32,
}

/// Apply the edits to a copy of the grid, returns the new grid and the number of clipped edits.
pub fn apply_edits(source: &PixelGrid, edits: &[Edit]) -> (PixelGrid, usize) {
    let mut out = source.clone();
    let mut clipped = 0;
    for edit in edits {
        let target = grid::value(&out, edit.row, edit.col) as i32 + edit.delta;
        let v = clip(target);
        if v as i32 != target {
            clipped += 1;
        }
        grid::set_value(&mut out, edit.row, edit.col, v);
    }
    (out, clipped)
}

/// Configuration to embed a watermark with.
#[derive(Debug, Clone, Copy)]
pub struct EmbedConfig {
    pub admission: Admission,
}

impl Default for EmbedConfig {
    /// Exact-match embedding at the histogram mode.
    fn default() -> Self {
        EmbedConfig {
            admission: Admission::Mode,
        }
    }
}

impl EmbedConfig {
    pub fn adaptive() -> Self {
        EmbedConfig {
            admission: Admission::Adaptive,
        }
    }
}

/// Result of an embedding.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub marked: PixelGrid,
    /// Bottom right pixel `(row, col)` of each block that received a bit, in embedding order.
    pub positions: Vec<(u32, u32)>,
    pub side_info: SideInfo,
    /// Number of pixel edits that saturated at 0 or 255; anything but zero breaks reversibility.
    pub saturated: usize,
}

impl Embedding {
    pub fn is_truncated(&self) -> bool {
        self.side_info.is_truncated()
    }
}

/// Embeds a bitstream into a grid.
pub struct Embedder {
    image: PixelGrid,
    records: Vec<PredictionErrorRecord>,
    histogram: ErrorHistogram,
    policy: Policy,
}

impl Embedder {
    /// Create an embedder, performing the prediction pre-pass over the whole grid.
    pub fn new(image: PixelGrid, config: EmbedConfig) -> Result<Self> {
        let records: Vec<_> = prediction::scan(&image).collect();
        let mut histogram = ErrorHistogram::new();
        for record in records.iter() {
            histogram.add(record.error);
        }
        let policy = match config.admission {
            Admission::Mode => {
                let (mode, count) = histogram.mode().ok_or(Error::NoBlocks)?;
                log::debug!("histogram mode is {mode} with {count} of {} blocks", histogram.total());
                Policy::exact_match(mode)
            }
            Admission::Fixed(threshold) => Policy::exact_match(threshold),
            Admission::Adaptive => Policy::adaptive(),
        };
        Ok(Embedder {
            image,
            records,
            histogram,
            policy,
        })
    }

    pub fn histogram(&self) -> &ErrorHistogram {
        &self.histogram
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Number of blocks that can carry a bit.
    pub fn capacity(&self) -> usize {
        self.records
            .iter()
            .filter(|r| self.policy.is_admissible(r.error))
            .count()
    }

    /// Determine the edits for this bitstream, and the positions that carry a bit.
    pub fn plan(&self, bits: &[bool]) -> (Vec<Edit>, Vec<(u32, u32)>) {
        let mut edits = vec![];
        let mut positions = vec![];
        let mut remaining = bits.iter();
        let mut next = remaining.next();
        for record in self.records.iter() {
            let Some(&bit) = next else {
                break;
            };
            if self.policy.is_admissible(record.error) {
                if bit {
                    edits.push(Edit {
                        row: record.row,
                        col: record.col,
                        delta: 1,
                    });
                }
                positions.push((record.row, record.col));
                next = remaining.next();
            } else if self.policy.is_shifted(record.error) {
                edits.push(Edit {
                    row: record.row,
                    col: record.col,
                    delta: 1,
                });
            }
        }
        (edits, positions)
    }

    /// Embed the bits and return the marked grid alongside the side information.
    pub fn mark(self, bits: &[bool]) -> Embedding {
        let (edits, positions) = self.plan(bits);
        let (marked, saturated) = apply_edits(&self.image, &edits);

        let side_info = SideInfo {
            policy: self.policy.kind,
            threshold: self.policy.threshold,
            requested: bits.len(),
            embedded: positions.len(),
        };
        log::debug!(
            "embedded {} of {} bits at threshold {} ({:?})",
            side_info.embedded,
            side_info.requested,
            side_info.threshold,
            side_info.policy
        );
        if side_info.is_truncated() {
            log::warn!(
                "capacity exhausted, only {} of {} bits embedded",
                side_info.embedded,
                side_info.requested
            );
        }
        if saturated != 0 {
            log::warn!("{saturated} pixels saturated during embedding, recovery will not be exact");
        }

        Embedding {
            marked,
            positions,
            side_info,
            saturated,
        }
    }
}

/// Embed the bits with the given admission rule.
pub fn embed(image: &PixelGrid, bits: &[bool], admission: Admission) -> Result<Embedding> {
    Ok(Embedder::new(image.clone(), EmbedConfig { admission })?.mark(bits))
}

/// Configuration to extract a watermark with.
#[derive(Debug, Clone, Copy)]
pub struct ExtractConfig {
    pub policy: Policy,
    /// Stop once this many bits are read.
    pub max_bits: usize,
    /// Keep collecting shifted blocks after the last bit; a truncated embedding shifted the whole
    /// grid.
    pub scan_to_end: bool,
}

impl Default for ExtractConfig {
    /// Exact-match extraction at error `0`, reading up to [`DEFAULT_MAX_BITS`].
    fn default() -> Self {
        (&SideInfo::legacy(DEFAULT_MAX_BITS)).into()
    }
}

impl From<&SideInfo> for ExtractConfig {
    fn from(side_info: &SideInfo) -> Self {
        ExtractConfig {
            policy: side_info.policy(),
            max_bits: side_info.embedded,
            scan_to_end: side_info.is_truncated(),
        }
    }
}

/// Result of an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub bits: Bitstream,
    /// Bottom right pixel `(row, col)` of each block that carried a bit, in extraction order.
    pub positions: Vec<(u32, u32)>,
    /// Bottom right pixel of each block visited before the stop that was shifted.
    pub shifted: Vec<(u32, u32)>,
    dimensions: (u32, u32),
}

impl Extraction {
    /// The edits that revert the embedding.
    pub fn recovery_edits(&self) -> Vec<Edit> {
        let bit_edits = self
            .positions
            .iter()
            .zip(self.bits.iter())
            .filter(|(_, bit)| **bit)
            .map(|(&(row, col), _)| Edit { row, col, delta: -1 });
        let shift_edits = self
            .shifted
            .iter()
            .map(|&(row, col)| Edit { row, col, delta: -1 });
        bit_edits.chain(shift_edits).collect()
    }

    /// Restore the pre-embedding grid from the grid this extraction was made from.
    pub fn recover(&self, marked: &PixelGrid) -> Result<PixelGrid> {
        if marked.dimensions() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                found: marked.dimensions(),
            });
        }
        let (recovered, _) = apply_edits(marked, &self.recovery_edits());
        Ok(recovered)
    }
}

/// Reads a bitstream from a marked grid.
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Self {
        Extractor { config }
    }

    pub fn from_side_info(side_info: &SideInfo) -> Self {
        Extractor::new(side_info.into())
    }

    pub fn extract(&self, marked: &PixelGrid) -> Extraction {
        let policy = self.config.policy;
        let mut extraction = Extraction {
            bits: vec![],
            positions: vec![],
            shifted: vec![],
            dimensions: marked.dimensions(),
        };
        if self.config.max_bits == 0 && !self.config.scan_to_end {
            return extraction;
        }
        for record in prediction::scan(marked) {
            let complete = extraction.bits.len() >= self.config.max_bits;
            // The bit moved an admissible error up by at most one; everything above was shifted.
            let offset = record.error - policy.threshold;
            if (offset == 0 || offset == 1) && !complete {
                extraction.bits.push(offset == 1);
                extraction.positions.push((record.row, record.col));
            } else if offset > policy.window() {
                extraction.shifted.push((record.row, record.col));
            }
            if extraction.bits.len() >= self.config.max_bits && !self.config.scan_to_end {
                break;
            }
        }
        log::debug!(
            "extracted {} bits, {} shifted blocks at threshold {}",
            extraction.bits.len(),
            extraction.shifted.len(),
            policy.threshold
        );
        extraction
    }
}

/// Extract using the side information of the embedding.
pub fn extract(marked: &PixelGrid, side_info: &SideInfo) -> Extraction {
    Extractor::from_side_info(side_info).extract(marked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(v: &[u8]) -> Bitstream {
        v.iter().map(|b| *b != 0).collect()
    }

    #[test]
    fn test_policy_windows() {
        let exact = Policy::exact_match(2);
        assert!(exact.is_admissible(2));
        assert!(!exact.is_admissible(3));
        assert!(exact.is_shifted(3));
        assert!(!exact.is_shifted(1));

        let adaptive = Policy::adaptive();
        assert!(adaptive.is_admissible(0));
        assert!(adaptive.is_admissible(1));
        assert!(!adaptive.is_admissible(-1));
        assert!(adaptive.is_shifted(2));
    }

    #[test]
    fn test_uniform_grid_embed() {
        let image = grid::filled(8, 8, 128);
        let embedding = embed(&image, &bits(&[1, 0, 1, 1]), Admission::Mode).unwrap();
        assert_eq!(embedding.side_info.threshold, 0);
        assert_eq!(embedding.positions, vec![(1, 1), (1, 3), (1, 5), (1, 7)]);
        let values: Vec<u8> = embedding
            .positions
            .iter()
            .map(|&(r, c)| grid::value(&embedding.marked, r, c))
            .collect();
        assert_eq!(values, vec![129, 128, 129, 129]);
        // Remaining blocks are untouched.
        assert_eq!(grid::value(&embedding.marked, 3, 1), 128);
    }

    #[test]
    fn test_shift_and_recover_nonzero_mode() {
        // Blocks with errors 2, 2, 5, 2, 1, 2; the mode is 2.
        let errors = [2, 2, 5, 2, 1, 2];
        let image = grid::from_fn(12, 2, |row, col| {
            let block = (col / 2) as usize;
            if row == 1 && col % 2 == 1 {
                (100 + errors[block]) as u8
            } else {
                100
            }
        });
        let payload = bits(&[1, 0, 0, 1]);
        let embedding = embed(&image, &payload, Admission::Mode).unwrap();
        assert_eq!(embedding.side_info.threshold, 2);
        assert_eq!(embedding.side_info.embedded, 4);
        assert_eq!(grid::value(&embedding.marked, 1, 5), 106);

        let extraction = extract(&embedding.marked, &embedding.side_info);
        assert_eq!(extraction.bits, payload);
        assert_eq!(extraction.positions, embedding.positions);
        assert_eq!(extraction.shifted, vec![(1, 5)]);
        assert_eq!(extraction.recover(&embedding.marked).unwrap(), image);
    }

    #[test]
    fn test_mode_tie_goes_to_first_block() {
        // Errors 5, 5, -2, -2 in scan order; both occur twice.
        let errors = [5, 5, -2, -2];
        let image = grid::from_fn(8, 2, |row, col| {
            if row == 1 && col % 2 == 1 {
                (100 + errors[(col / 2) as usize]) as u8
            } else {
                100
            }
        });
        let embedding = embed(&image, &bits(&[1, 0]), Admission::Mode).unwrap();
        assert_eq!(embedding.side_info.threshold, 5);
        assert_eq!(embedding.positions, vec![(1, 1), (1, 3)]);
    }

    #[test]
    fn test_embedding_stops_after_last_bit() {
        let mut image = grid::filled(8, 2, 10);
        // Last block has a large error, it must not be shifted since the bits run out before it.
        grid::set_value(&mut image, 1, 7, 50);
        let embedding = embed(&image, &bits(&[1, 1]), Admission::Fixed(0)).unwrap();
        assert_eq!(grid::value(&embedding.marked, 1, 7), 50);
        assert_eq!(embedding.positions.len(), 2);
    }

    #[test]
    fn test_capacity_and_truncation() {
        let image = grid::filled(4, 4, 7);
        let embedder = Embedder::new(image, EmbedConfig::default()).unwrap();
        assert_eq!(embedder.capacity(), 4);
        let embedding = embedder.mark(&bits(&[1, 1, 1, 1, 1, 1]));
        assert!(embedding.is_truncated());
        assert_eq!(embedding.side_info.requested, 6);
        assert_eq!(embedding.side_info.embedded, 4);
        assert_eq!(embedding.positions.len(), 4);
    }

    #[test]
    fn test_saturation_counted() {
        let image = grid::filled(2, 2, 255);
        let embedding = embed(&image, &bits(&[1]), Admission::Mode).unwrap();
        assert_eq!(embedding.saturated, 1);
        assert_eq!(grid::value(&embedding.marked, 1, 1), 255);
    }

    #[test]
    fn test_no_blocks() {
        let image = grid::filled(1, 5, 0);
        assert!(matches!(
            Embedder::new(image.clone(), EmbedConfig::default()),
            Err(Error::NoBlocks)
        ));
        // A fixed threshold needs no histogram and simply embeds nothing.
        let embedding = embed(&image, &bits(&[1]), Admission::Fixed(0)).unwrap();
        assert_eq!(embedding.side_info.embedded, 0);
    }

    #[test]
    fn test_empty_bitstream() {
        let image = grid::filled(4, 4, 9);
        let embedding = embed(&image, &[], Admission::Mode).unwrap();
        assert_eq!(embedding.marked, image);
        let extraction = extract(&embedding.marked, &embedding.side_info);
        assert!(extraction.bits.is_empty());
        assert!(extraction.shifted.is_empty());
    }

    #[test]
    fn test_default_extract_config_is_legacy() {
        let config = ExtractConfig::default();
        assert_eq!(config.policy, Policy::exact_match(0));
        assert_eq!(config.max_bits, DEFAULT_MAX_BITS);
        assert!(!config.scan_to_end);
    }

    #[test]
    fn test_truncated_embedding_recovers_trailing_shifts() {
        // One admissible block followed by a shifted one.
        let mut image = grid::filled(4, 2, 20);
        grid::set_value(&mut image, 1, 3, 30);
        let embedding = embed(&image, &bits(&[1, 1]), Admission::Fixed(0)).unwrap();
        assert!(embedding.is_truncated());
        assert_eq!(grid::value(&embedding.marked, 1, 3), 31);

        let extraction = extract(&embedding.marked, &embedding.side_info);
        assert_eq!(extraction.bits, bits(&[1]));
        assert_eq!(extraction.shifted, vec![(1, 3)]);
        assert_eq!(extraction.recover(&embedding.marked).unwrap(), image);
    }

    #[test]
    fn test_recover_rejects_other_grid() {
        let image = grid::filled(4, 4, 9);
        let extraction = Extractor::new(ExtractConfig::default()).extract(&image);
        assert!(extraction.recover(&grid::filled(2, 2, 0)).is_err());
    }

    #[test]
    fn test_side_info_json() {
        let side_info = SideInfo {
            policy: PolicyKind::Adaptive,
            threshold: 0,
            requested: 10,
            embedded: 8,
        };
        let s = serde_json::to_string(&side_info).unwrap();
        assert!(s.contains("\"adaptive\""));
        let back: SideInfo = serde_json::from_str(&s).unwrap();
        assert_eq!(back, side_info);
        assert!(back.is_truncated());
    }
}
