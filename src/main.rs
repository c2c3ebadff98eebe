use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use vectorit::{
    BundledEngineSource, ColorCount, Converter, DetailLevel, EngineLoader, ImageAsset,
    TraceSettings,
};

/// Convert a raster image (PNG, JPEG, WEBP) into scalable SVG markup.
#[derive(Parser)]
#[command(name = "vectorit", version)]
struct Cli {
    /// Input raster image
    input: PathBuf,
    /// Output SVG file
    output: PathBuf,
    /// Tracing regime
    #[arg(long, value_enum, default_value = "smooth")]
    detail: DetailArg,
    /// Number of quantization colors (2, 4, 16, 32, 64 or 128)
    #[arg(long, default_value_t = 16)]
    colors: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum DetailArg {
    Smooth,
    Sharp,
    Exact,
}

impl From<DetailArg> for DetailLevel {
    fn from(detail: DetailArg) -> Self {
        match detail {
            DetailArg::Smooth => DetailLevel::Smooth,
            DetailArg::Sharp => DetailLevel::Sharp,
            DetailArg::Exact => DetailLevel::Exact,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    let Some(colors) = ColorCount::new(cli.colors) else {
        eprintln!("--colors must be one of 2, 4, 16, 32, 64, 128");
        process::exit(1);
    };
    let settings = TraceSettings {
        detail: cli.detail.into(),
        colors,
    };

    let bytes = match fs::read(&cli.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading input file '{}': {}", cli.input.display(), e);
            process::exit(2);
        }
    };

    let asset = match ImageAsset::from_bytes(bytes) {
        Ok(asset) => asset,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    let loader = Arc::new(EngineLoader::new(vec![Box::new(BundledEngineSource)]));
    let converter = Converter::new(loader);

    let result = match converter.convert(asset, settings).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Conversion failed: {}", e);
            process::exit(3);
        }
    };

    match fs::write(&cli.output, &result.markup) {
        Ok(()) => {
            println!(
                "Successfully converted '{}' to '{}'",
                cli.input.display(),
                cli.output.display()
            );
        }
        Err(e) => {
            eprintln!("Error writing output file '{}': {}", cli.output.display(), e);
            process::exit(4);
        }
    }
}
