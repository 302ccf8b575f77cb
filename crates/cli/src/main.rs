//! vdiff - binary delta between two directory-tree snapshots

use anyhow::Result;
use clap::{Parser, ValueEnum};
use cli_lib::{run, util};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use vdiff_core::{DiffConfig, ValidationMode};

/// Build a compact binary patch that turns one directory tree into
/// another without retransmitting unchanged bytes.
#[derive(Parser)]
#[command(name = "vdiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root of the folder that contains the version you're updating from
    #[arg(long = "from", value_name = "DIR")]
    from: PathBuf,

    /// Root of the folder that contains the version you're updating to
    #[arg(long = "to", value_name = "DIR")]
    to: PathBuf,

    /// Which validation listings to embed in the patch
    #[arg(long, value_enum, default_value = "all")]
    validation: ValidationArg,

    /// Where to write the patch archive
    #[arg(short, long, default_value = "./v-diff.tar.gz")]
    output: PathBuf,

    /// Block size in bytes
    #[arg(long, default_value_t = vdiff_core::DEFAULT_BLOCK_SIZE)]
    block_size: u64,
}

/// CLI mirror of the engine's validation mode.
#[derive(Clone, Copy, ValueEnum)]
enum ValidationArg {
    /// Listing for the input (old) tree only
    Input,
    /// Listing for the output (new) tree only
    Output,
    /// Listings for both trees
    All,
    /// No validation listings
    None,
}

impl From<ValidationArg> for ValidationMode {
    fn from(arg: ValidationArg) -> Self {
        match arg {
            ValidationArg::Input => ValidationMode::Input,
            ValidationArg::Output => ValidationMode::Output,
            ValidationArg::All => ValidationMode::All,
            ValidationArg::None => ValidationMode::None,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = DiffConfig {
        source_root: cli.from,
        target_root: cli.to,
        validation: cli.validation.into(),
        output: cli.output,
        block_size: cli.block_size,
    };

    println!(
        "Building patch: {} -> {}",
        config.source_root.display().to_string().yellow(),
        config.target_root.display().to_string().yellow(),
    );

    let summary = run::generate(&config)?;

    println!();
    println!("{}", "Patch Summary".bold());
    println!(
        "  {} files ({} copied whole)",
        summary.files,
        summary.whole_file_copies.to_string().green(),
    );
    println!(
        "  {} blocks copied, {} written as literals ({})",
        summary.blocks_copied.to_string().green(),
        summary.blocks_written.to_string().yellow(),
        util::format_size(summary.literal_bytes),
    );
    println!("  archive: {}", config.output.display().to_string().cyan());

    Ok(())
}
