use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use image_to_palette_wasm::{ExtractorConfig, Palette, extract_palette_from_image};
use anyhow::Context;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Space-separated `#rrggbb` colors
    Hex,
    /// Dash-joined colors without `#`, as used by palette search
    Dashed,
    /// JSON with per-color weight and coverage
    Json,
}

/// Extract a representative color palette from images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Maximum number of palette colors
    #[arg(short = 'k', long, default_value_t = 5)]
    palette_size: usize,

    /// Resize so the longest side is this many pixels before extracting
    #[arg(short, long)]
    downscale: Option<u32>,

    /// Seed separation constant (larger spreads colors further apart)
    #[arg(short, long)]
    attenuation: Option<f64>,

    /// Safety cap on k-means passes
    #[arg(short, long)]
    max_iterations: Option<usize>,

    /// JSON file with an `ExtractorConfig`; flags above override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Hex)]
    format: Format,
}

fn load_config(args: &Args) -> Result<ExtractorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<ExtractorConfig>(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ExtractorConfig::default(),
    };
    if let Some(a) = args.attenuation {
        config = config.with_attenuation(a);
    }
    if let Some(m) = args.max_iterations {
        config = config.with_max_iterations(m);
    }
    config.validate().context("invalid extractor configuration")?;
    Ok(config)
}

fn render(palette: &Palette, format: Format) -> Result<String> {
    Ok(match format {
        Format::Hex => palette.hex().join(" "),
        Format::Dashed => palette.to_palette_string(),
        Format::Json => serde_json::to_string(&palette.entries())?,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let palette = extract_palette_from_image(&bytes, args.palette_size, args.downscale, config)
            .with_context(|| format!("palette extraction failed for {}", input.display()))?;

        if args.inputs.len() > 1 {
            println!("{}: {}", input.display(), render(&palette, args.format)?);
        } else {
            println!("{}", render(&palette, args.format)?);
        }
    }

    Ok(())
}
