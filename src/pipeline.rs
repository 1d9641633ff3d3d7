//! In-memory orchestration of the full pipeline.
//!
//! - [`encrypt`]: split into bit planes, share additively, scramble both shares.
//! - [`embed_watermark`]: exact-match embedding into the first (scrambled) share.
//! - [`decrypt_and_extract`]: read the watermark and recover the original grid.
//! - [`robust_embed`]: adaptive embedding directly into the high significance plane.

use crate::algorithm::{self, Admission, Embedding, Extraction, SideInfo};
use crate::bitplane::{self, BitPlanes};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::grid::{self, PixelGrid};
use crate::permutation::PermutationMap;
use crate::share::{self, Shares};
use rand::Rng;

/// Output of the encryption phase.
#[derive(Debug, Clone)]
pub struct Encrypted {
    pub planes: BitPlanes,
    /// Both shares after block scrambling.
    pub shares: Shares,
}

/// Split, share and scramble the grid.
///
/// All preconditions are checked before any work is done.
pub fn encrypt<R: Rng + ?Sized>(
    image: &PixelGrid,
    config: &PipelineConfig,
    rng: &mut R,
) -> Result<Encrypted> {
    let map = PermutationMap::for_grid(image, config.block_size, config.key)?;
    let planes = bitplane::split(image, config.bit_depth)?;
    let shares = planes.share(rng)?;
    let scrambled = Shares {
        share1: map.scramble(&shares.share1)?,
        share2: map.scramble(&shares.share2)?,
    };
    log::debug!(
        "encrypted {:?} grid, bit depth {}, {} blocks scrambled",
        image.dimensions(),
        config.bit_depth,
        map.block_count()
    );
    Ok(Encrypted {
        planes,
        shares: scrambled,
    })
}

/// Embed the watermark into a share with the exact-match policy.
pub fn embed_watermark(share: &PixelGrid, bits: &[bool]) -> Result<Embedding> {
    algorithm::embed(share, bits, Admission::Mode)
}

/// Embed the watermark into the high significance plane with the adaptive policy.
pub fn robust_embed(hsb: &PixelGrid, bits: &[bool]) -> Result<Embedding> {
    algorithm::embed(hsb, bits, Admission::Adaptive)
}

/// Where the extraction engine reads the watermark from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionDomain {
    /// Read the marked share before recombination, in the scrambled layout the bits were
    /// embedded in. Recovery of the original grid is exact.
    #[default]
    Share,
    /// Unscramble and recombine first, then read the composite grid. The composite has the
    /// prediction errors of the original grid and the unscrambled block order, so the bits read
    /// generally differ from the embedded ones.
    Composite,
}

/// Output of the decryption phase.
#[derive(Debug, Clone)]
pub struct Decrypted {
    /// The recombined grid before recovery, still carrying the embedding.
    pub marked: PixelGrid,
    pub extraction: Extraction,
    pub recovered: PixelGrid,
}

/// Unscramble and recombine the shares, extract the watermark and recover the grid.
///
/// `marked_share1` is the share that carries the watermark.
pub fn decrypt_and_extract(
    marked_share1: &PixelGrid,
    marked_share2: &PixelGrid,
    config: &PipelineConfig,
    side_info: &SideInfo,
    domain: ExtractionDomain,
) -> Result<Decrypted> {
    grid::ensure_same_dimensions(marked_share1, marked_share2)?;
    let map = PermutationMap::for_grid(marked_share1, config.block_size, config.key)?;
    let share2 = map.unscramble(marked_share2)?;
    let marked = share::combine_shares(&map.unscramble(marked_share1)?, &share2)?;

    let (extraction, recovered) = match domain {
        ExtractionDomain::Share => {
            let extraction = algorithm::extract(marked_share1, side_info);
            let share1 = map.unscramble(&extraction.recover(marked_share1)?)?;
            let recovered = share::combine_shares(&share1, &share2)?;
            (extraction, recovered)
        }
        ExtractionDomain::Composite => {
            let extraction = algorithm::extract(&marked, side_info);
            let recovered = extraction.recover(&marked)?;
            (extraction, recovered)
        }
    };
    log::debug!(
        "extracted {} bits from the {:?} domain",
        extraction.bits.len(),
        domain
    );
    Ok(Decrypted {
        marked,
        extraction,
        recovered,
    })
}
