//! Pipeline phases that persist their artifacts in a working directory.
//!
//! Each phase reads the artifacts of the previous one from disk, so phases may run in separate
//! invocations. All grids are stored as PNG, side information as json.

use crate::algorithm::{Embedding, SideInfo};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::metrics::{self, Evaluation};
use crate::pipeline::{self, Decrypted, Encrypted, ExtractionDomain};
use crate::{bitplane, io, watermark};
use rand::Rng;
use std::path::{Path, PathBuf};

/// Locations of all artifacts inside the working directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    pub fn new(dir: &Path) -> Self {
        Workspace {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn share1(&self) -> PathBuf {
        self.dir.join("share1.png")
    }
    pub fn share2(&self) -> PathBuf {
        self.dir.join("share2.png")
    }
    pub fn marked_share1(&self) -> PathBuf {
        self.dir.join("marked_share1.png")
    }
    pub fn marked_share2(&self) -> PathBuf {
        self.dir.join("marked_share2.png")
    }
    pub fn side_info(&self) -> PathBuf {
        self.dir.join("side_info.json")
    }
    pub fn recovered(&self) -> PathBuf {
        self.dir.join("recovered_image.png")
    }
    pub fn extracted_watermark(&self) -> PathBuf {
        self.dir.join("extracted_watermark.png")
    }
    pub fn robust_marked(&self) -> PathBuf {
        self.dir.join("robust_marked_image.png")
    }
    pub fn robust_side_info(&self) -> PathBuf {
        self.dir.join("robust_side_info.json")
    }
    pub fn evaluation(&self) -> PathBuf {
        self.dir.join("evaluation.json")
    }
}

/// Encrypt the cover image and store both scrambled shares.
pub fn run_encryption<R: Rng + ?Sized>(
    workspace: &Workspace,
    cover: &Path,
    config: &PipelineConfig,
    rng: &mut R,
) -> Result<Encrypted> {
    log::info!("phase 1: image encryption");
    let image = io::load_grid(cover)?;
    let encrypted = pipeline::encrypt(&image, config, rng)?;
    io::save_grid(&workspace.share1(), &encrypted.shares.share1)?;
    io::save_grid(&workspace.share2(), &encrypted.shares.share2)?;
    log::info!("shares written to {:?}", workspace.dir());
    Ok(encrypted)
}

/// Embed the watermark into the first share, the second share is passed on unmodified.
pub fn run_embedding(workspace: &Workspace, watermark_path: &Path) -> Result<Embedding> {
    log::info!("phase 2: watermark embedding");
    let share1 = io::load_grid(&workspace.share1())?;
    let share2 = io::load_grid(&workspace.share2())?;
    let bits = watermark::bits_from_image(&io::load_grid(watermark_path)?);
    let embedding = pipeline::embed_watermark(&share1, &bits)?;
    io::save_grid(&workspace.marked_share1(), &embedding.marked)?;
    io::save_grid(&workspace.marked_share2(), &share2)?;
    io::save_side_info(&workspace.side_info(), &embedding.side_info)?;
    log::info!(
        "watermark embedded in {} of {} positions",
        embedding.side_info.embedded,
        embedding.side_info.requested
    );
    Ok(embedding)
}

/// Decrypt the marked shares, extract the watermark and recover the cover image.
///
/// Without stored side information the extraction falls back to [`SideInfo::legacy`].
pub fn run_extraction(
    workspace: &Workspace,
    config: &PipelineConfig,
    domain: ExtractionDomain,
) -> Result<Decrypted> {
    log::info!("phase 3: decryption and watermark extraction");
    let marked_share1 = io::load_grid(&workspace.marked_share1())?;
    let marked_share2 = io::load_grid(&workspace.marked_share2())?;
    let side_info = match io::load_side_info(&workspace.side_info()) {
        Ok(side_info) => side_info,
        Err(Error::NotFound(path)) => {
            log::warn!("no side information at {path:?}, assuming a histogram mode of 0");
            SideInfo::legacy(config.max_bits)
        }
        Err(e) => return Err(e),
    };
    let decrypted =
        pipeline::decrypt_and_extract(&marked_share1, &marked_share2, config, &side_info, domain)?;
    io::save_grid(&workspace.recovered(), &decrypted.recovered)?;
    io::save_grid(
        &workspace.extracted_watermark(),
        &watermark::bits_to_image(&decrypted.extraction.bits),
    )?;
    log::info!("extracted {} bits", decrypted.extraction.bits.len());
    Ok(decrypted)
}

/// Embed the watermark into the high significance plane of the cover with the adaptive policy.
pub fn run_robust(
    workspace: &Workspace,
    cover: &Path,
    watermark_path: &Path,
    config: &PipelineConfig,
) -> Result<Embedding> {
    log::info!("phase 4: robust embedding into the high significance plane");
    let image = io::load_grid(cover)?;
    let planes = bitplane::split(&image, config.bit_depth)?;
    let bits = watermark::bits_from_image(&io::load_grid(watermark_path)?);
    let embedding = pipeline::robust_embed(&planes.hsb, &bits)?;
    io::save_grid(&workspace.robust_marked(), &embedding.marked)?;
    io::save_side_info(&workspace.robust_side_info(), &embedding.side_info)?;
    log::info!(
        "robust watermark embedded in {} of {} positions",
        embedding.side_info.embedded,
        embedding.side_info.requested
    );
    Ok(embedding)
}

/// Compute the quality metrics over the stored artifacts.
pub fn run_evaluation(
    workspace: &Workspace,
    cover: &Path,
    watermark_path: &Path,
) -> Result<Evaluation> {
    log::info!("phase 5: evaluation");
    let original = io::load_grid(cover)?;
    let recovered = io::load_grid(&workspace.recovered())?;
    let encrypted = io::load_grid(&workspace.share1())?;
    let embedded_bits = watermark::bits_from_image(&io::load_grid(watermark_path)?);
    let extracted_bits =
        watermark::bits_from_image(&io::load_grid(&workspace.extracted_watermark())?);
    let evaluation = metrics::evaluate(
        &original,
        &recovered,
        &encrypted,
        &embedded_bits,
        &extracted_bits,
    )?;
    std::fs::write(
        workspace.evaluation(),
        serde_json::to_string_pretty(&evaluation)?,
    )?;
    Ok(evaluation)
}
