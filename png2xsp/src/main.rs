use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xsp_converter::{
    ConfigV1, ConvertConfig, IndexedImage, Layout, Mode, ModeSelect, Origin, packer,
};

/// Convert an indexed PNG sprite sheet into XSP sprite data.
///
/// The sheet is chopped into frames of a fixed size. Empty space inside a frame is skipped, so
/// frames may be much bigger than the sprites drawn in them.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Indexed PNG sprite sheet
    sprites: PathBuf,

    /// Width of a frame within the sheet (decimal or hex)
    #[arg(value_parser = parse_dimension)]
    width: usize,

    /// Height of a frame within the sheet (decimal or hex)
    #[arg(value_parser = parse_dimension)]
    height: usize,

    /// Base file path and name for output
    outname: PathBuf,

    /// Where (0, 0) lies in each frame: l/c/r followed by t/c/b, e.g. "cb" for centre-bottom
    #[arg(value_parser = parse_origin)]
    origin: Option<Origin>,

    /// Write a single .xsb bundle instead of separate files
    #[arg(short, long)]
    bundle: bool,

    /// Conversion mode: auto, composite or single
    #[arg(short, long, value_parser = parse_mode)]
    mode: Option<ModeSelect>,

    /// TOML file with default origin, mode and layout
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log every frame as it is chopped
    #[arg(short, long)]
    verbose: bool,
}

fn parse_dimension(value: &str) -> Result<usize, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => value.parse(),
    };

    parsed.map_err(|e| format!("{value} is not a valid size: {e}"))
}

fn parse_origin(value: &str) -> Result<Origin, String> {
    value.parse().map_err(|e| format!("{e}"))
}

fn parse_mode(value: &str) -> Result<ModeSelect, String> {
    value.parse().map_err(|e| format!("{e}"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().compact())
        .init();

    let mut config = ConvertConfig::new(args.width, args.height);
    if let Some(path) = &args.config {
        let file = ConfigV1::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        config = file.apply(config);
    }
    if let Some(origin) = args.origin {
        config = config.with_origin(origin);
    }
    if let Some(mode) = args.mode {
        config = config.with_mode(mode);
    }
    if args.bundle {
        config = config.with_layout(Layout::Bundle);
    }

    let image = IndexedImage::load_png(&args.sprites)
        .with_context(|| format!("Failed to load {}", args.sprites.display()))?;
    tracing::info!(
        "Loaded \"{}\": {} x {}",
        args.sprites.display(),
        image.width(),
        image.height()
    );

    let conversion = xsp_converter::convert(&image, &config)?;

    match conversion.mode() {
        Mode::SingleTile => println!("{} SP.", conversion.patterns().len()),
        Mode::Composite => {
            println!("{} XSP.", conversion.patterns().len());
            println!("{} FRM.", conversion.composition().len());
            println!("{} REF.", conversion.references().len());
        }
    }

    let written = packer::write(&conversion, config.layout, &args.outname)?;
    for path in &written {
        tracing::debug!(path = %path.display(), "wrote output");
    }

    if let Some(truncated) = conversion.truncated() {
        tracing::warn!("output is incomplete: {truncated}");
    }

    Ok(())
}
