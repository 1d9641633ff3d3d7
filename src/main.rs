use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;
use reversible_share_watermarking as rsw;
use rsw::phase::{self, Workspace};
use rsw::{ExtractionDomain, PipelineConfig};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,

    /// Json file with the pipeline configuration.
    #[clap(long, global = true, value_parser)]
    config: Option<PathBuf>,

    /// Working directory for the artifacts, overrides the configuration.
    #[clap(long, global = true, value_parser)]
    output: Option<PathBuf>,

    /// Block permutation key, overrides the configuration.
    #[clap(long, global = true, value_parser)]
    key: Option<u64>,

    /// Log debug output.
    #[clap(short, long, global = true, action)]
    verbose: bool,
}

#[derive(Args)]
struct Cover {
    /// The cover image.
    #[clap(long, default_value = "images/lena.png", value_parser)]
    cover: PathBuf,
}

#[derive(Args)]
struct Watermark {
    /// The binary watermark image.
    #[clap(long, default_value = "images/watermark.png", value_parser)]
    watermark: PathBuf,
}

#[derive(Args)]
struct Embed {
    #[clap(flatten)]
    watermark: Watermark,

    /// Write the prediction error map of the first share to this file.
    #[clap(long, value_parser)]
    dump_errors: Option<PathBuf>,
}

#[derive(Args)]
struct Extract {
    /// Extract from the recombined composite instead of the marked share.
    #[clap(long, action)]
    composite: bool,
}

#[derive(Args)]
struct Both {
    #[clap(flatten)]
    cover: Cover,

    #[clap(flatten)]
    watermark: Watermark,
}

#[derive(Args)]
struct All {
    #[clap(flatten)]
    inputs: Both,

    #[clap(flatten)]
    extract: Extract,
}

#[derive(Subcommand)]
enum Commands {
    /// Split, share and scramble the cover image.
    Encrypt(Cover),
    /// Embed the watermark into the first share.
    Embed(Embed),
    /// Decrypt, extract the watermark and recover the cover.
    Extract(Extract),
    /// Embed the watermark into the high significance plane of the cover.
    Robust(Both),
    /// Compute quality metrics over the stored artifacts.
    Evaluate(Both),
    /// Run every phase in order.
    All(All),
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Builder::new()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("could not load configuration at {path:?}"))?,
        None => PipelineConfig::default(),
    };
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(key) = cli.key {
        config.key = key;
    }
    Ok(config)
}

fn domain(extract: &Extract) -> ExtractionDomain {
    if extract.composite {
        ExtractionDomain::Composite
    } else {
        ExtractionDomain::Share
    }
}

fn evaluate(workspace: &Workspace, inputs: &Both) -> Result<()> {
    let evaluation =
        phase::run_evaluation(workspace, &inputs.cover.cover, &inputs.watermark.watermark)
            .context("evaluation failed")?;
    println!("{evaluation}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let config = load_config(&cli)?;
    let workspace = Workspace::new(&config.output_dir);
    let mut rng = rand::thread_rng();

    match &cli.command {
        Some(Commands::Encrypt(v)) => {
            phase::run_encryption(&workspace, &v.cover, &config, &mut rng)
                .context("encryption failed")?;
        }
        Some(Commands::Embed(v)) => {
            phase::run_embedding(&workspace, &v.watermark.watermark).context("embedding failed")?;
            if let Some(path) = &v.dump_errors {
                let share1 = rsw::io::load_grid(&workspace.share1())?;
                rsw::util::dump_error_map(&share1, path)?;
            }
        }
        Some(Commands::Extract(v)) => {
            phase::run_extraction(&workspace, &config, domain(v)).context("extraction failed")?;
        }
        Some(Commands::Robust(v)) => {
            phase::run_robust(&workspace, &v.cover.cover, &v.watermark.watermark, &config)
                .context("robust embedding failed")?;
        }
        Some(Commands::Evaluate(v)) => {
            evaluate(&workspace, v)?;
        }
        Some(Commands::All(v)) => {
            let inputs = &v.inputs;
            phase::run_encryption(&workspace, &inputs.cover.cover, &config, &mut rng)
                .context("encryption failed")?;
            phase::run_embedding(&workspace, &inputs.watermark.watermark)
                .context("embedding failed")?;
            phase::run_extraction(&workspace, &config, domain(&v.extract))
                .context("extraction failed")?;
            phase::run_robust(&workspace, &inputs.cover.cover, &inputs.watermark.watermark, &config)
                .context("robust embedding failed")?;
            evaluate(&workspace, inputs)?;
        }
        None => {}
    }
    Ok(())
}
