use chart::{AnalysisConfig, ChartPipeline};
use clap::{Parser, Subcommand};
use cli::{OcrDocument, load_config, load_region, summary};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the chart in an image region and print the analysis as JSON
    Analyze {
        /// Path to the region image (any format the image crate reads)
        #[arg(short, long)]
        image: PathBuf,
        /// OCR text regions (.json or .toml)
        #[arg(long)]
        ocr: Option<PathBuf>,
        /// Analysis configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Also write detected shapes as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the JSON schema of the configuration file
    Schema,
    /// Print the default configuration as TOML
    DefaultConfig,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze {
            image,
            ocr,
            config,
            geojson,
            pretty,
        } => {
            analyze_region(image, ocr.as_deref(), config.as_deref(), geojson.as_deref(), *pretty)?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&AnalysisConfig::schema())?);
        }
        Commands::DefaultConfig => {
            print!("{}", AnalysisConfig::default().to_toml()?);
        }
    }

    Ok(())
}

fn analyze_region(
    image_path: &Path,
    ocr_path: Option<&Path>,
    config_path: Option<&Path>,
    geojson_path: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let region = load_region(image_path)?;
    let ocr = match ocr_path {
        Some(path) => OcrDocument::from_file(path)?,
        None => {
            warn!("No OCR regions given; values will be shape-relative");
            OcrDocument::default()
        }
    };
    info!(
        "Analyzing {:?} ({}x{}, {} text regions)",
        image_path,
        region.width(),
        region.height(),
        ocr.regions.len()
    );

    let pipeline = ChartPipeline::from_config(&config);
    let analysis = pipeline.analyze(&region, &ocr.regions);
    info!("{}", summary(&analysis));

    if let Some(path) = geojson_path {
        analysis.save_geojson(path)?;
        info!("Shapes written to {:?}", path);
    }

    println!("{}", analysis.to_json(pretty)?);
    Ok(())
}
