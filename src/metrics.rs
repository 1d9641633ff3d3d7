//! Quality metrics over grids and bitstreams.
//!
//! These are read-only observers of the pipeline outputs: PSNR and SSIM between the original and
//! the recovered grid, NPCR between the original and an encrypted share, and the bit error rate
//! between the embedded and extracted watermark.

use crate::error::{Error, Result};
use crate::grid::{self, PixelGrid};
use serde::Serialize;

/// Peak value of an 8 bit pixel.
const PIXEL_MAX: f64 = 255.0;

/// Side of the square SSIM window.
pub const SSIM_WINDOW: u32 = 7;

/// Peak signal to noise ratio in dB, infinite for identical grids.
pub fn psnr(original: &PixelGrid, test: &PixelGrid) -> Result<f64> {
    grid::ensure_same_dimensions(original, test)?;
    let (width, height) = original.dimensions();
    let n = width as usize * height as usize;
    if n == 0 {
        return Ok(f64::INFINITY);
    }
    let sum_sq: f64 = original
        .pixels()
        .zip(test.pixels())
        .map(|(a, b)| {
            let d = a.0[0] as f64 - b.0[0] as f64;
            d * d
        })
        .sum();
    let mse = sum_sq / n as f64;
    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(20.0 * (PIXEL_MAX / mse.sqrt()).log10())
}

/// Mean structural similarity over all complete 7x7 windows.
///
/// Uses a uniform window, a data range of 255, `K1 = 0.01`, `K2 = 0.03` and sample covariances.
pub fn ssim(original: &PixelGrid, test: &PixelGrid) -> Result<f64> {
    grid::ensure_same_dimensions(original, test)?;
    let (width, height) = original.dimensions();
    if width < SSIM_WINDOW || height < SSIM_WINDOW {
        return Err(Error::TooSmall {
            width,
            height,
            window: SSIM_WINDOW,
        });
    }
    let c1 = (0.01 * PIXEL_MAX).powi(2);
    let c2 = (0.03 * PIXEL_MAX).powi(2);
    let np = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let cov_norm = np / (np - 1.0);

    let mut total = 0.0;
    let mut windows = 0usize;
    for top in 0..=(height - SSIM_WINDOW) {
        for left in 0..=(width - SSIM_WINDOW) {
            let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for row in top..top + SSIM_WINDOW {
                for col in left..left + SSIM_WINDOW {
                    let x = grid::value(original, row, col) as f64;
                    let y = grid::value(test, row, col) as f64;
                    sx += x;
                    sy += y;
                    sxx += x * x;
                    syy += y * y;
                    sxy += x * y;
                }
            }
            let (ux, uy) = (sx / np, sy / np);
            let vx = cov_norm * (sxx / np - ux * ux);
            let vy = cov_norm * (syy / np - uy * uy);
            let vxy = cov_norm * (sxy / np - ux * uy);
            let s = ((2.0 * ux * uy + c1) * (2.0 * vxy + c2))
                / ((ux * ux + uy * uy + c1) * (vx + vy + c2));
            total += s;
            windows += 1;
        }
    }
    Ok(total / windows as f64)
}

/// Fraction of pixels that differ between the two grids.
pub fn npcr(original: &PixelGrid, test: &PixelGrid) -> Result<f64> {
    grid::ensure_same_dimensions(original, test)?;
    let (width, height) = original.dimensions();
    let n = width as usize * height as usize;
    if n == 0 {
        return Ok(0.0);
    }
    let changed = original
        .pixels()
        .zip(test.pixels())
        .filter(|(a, b)| a != b)
        .count();
    Ok(changed as f64 / n as f64)
}

/// Fraction of differing bits, the streams must be equally long.
pub fn ber(original: &[bool], extracted: &[bool]) -> Result<f64> {
    if original.len() != extracted.len() {
        return Err(Error::LengthMismatch {
            expected: original.len(),
            found: extracted.len(),
        });
    }
    if original.is_empty() {
        return Ok(0.0);
    }
    let errors = original
        .iter()
        .zip(extracted.iter())
        .filter(|(a, b)| a != b)
        .count();
    Ok(errors as f64 / original.len() as f64)
}

/// Bit error rate over the common prefix of two streams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BitErrorRate {
    pub rate: f64,
    /// Number of bits compared.
    pub compared: usize,
    /// True if one of the streams was longer and got truncated.
    pub partial: bool,
}

/// Compare the streams up to the length of the shorter one, flagging the truncation.
pub fn ber_truncated(original: &[bool], extracted: &[bool]) -> BitErrorRate {
    let compared = original.len().min(extracted.len());
    // Equal lengths by construction.
    let rate = ber(&original[..compared], &extracted[..compared]).unwrap_or(0.0);
    BitErrorRate {
        rate,
        compared,
        partial: original.len() != extracted.len(),
    }
}

/// Summary of a full pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Original versus recovered, `None` when identical.
    pub psnr: Option<f64>,
    /// Original versus recovered.
    pub ssim: f64,
    /// Original versus encrypted share.
    pub npcr: f64,
    /// Embedded versus extracted watermark.
    pub ber: BitErrorRate,
}

/// Compute all metrics of a run.
pub fn evaluate(
    original: &PixelGrid,
    recovered: &PixelGrid,
    encrypted: &PixelGrid,
    original_watermark: &[bool],
    extracted_watermark: &[bool],
) -> Result<Evaluation> {
    let psnr = psnr(original, recovered)?;
    Ok(Evaluation {
        psnr: psnr.is_finite().then_some(psnr),
        ssim: ssim(original, recovered)?,
        npcr: npcr(original, encrypted)?,
        ber: ber_truncated(original_watermark, extracted_watermark),
    })
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.psnr {
            Some(v) => writeln!(f, "PSNR: {v:.2} dB")?,
            None => writeln!(f, "PSNR: inf dB")?,
        }
        writeln!(f, "SSIM: {:.4}", self.ssim)?;
        writeln!(f, "NPCR: {:.2}%", self.npcr * 100.0)?;
        write!(
            f,
            "BER: {:.2}% over {} bits{}",
            self.ber.rate * 100.0,
            self.ber.compared,
            if self.ber.partial { " (truncated)" } else { "" }
        )
    }
}
