use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use image_forensics::models::{ForensicsResponse, parse_payload};
use image_forensics::{ApiResult, ForensicsClient, ForensicsService, config, image, report};

#[derive(Parser, Debug)]
#[command(
    name = "forensics-cli",
    version,
    about = "Client for the image metadata and tamper forensics service"
)]
struct Cli {
    /// Operation to run
    #[arg(short, long, value_enum)]
    action: Option<Action>,

    /// Image file (metadata, forensics)
    #[arg(long, value_name = "FILE")]
    image: Option<PathBuf>,

    /// Image files or directories (batch)
    #[arg(long, value_name = "PATH", num_args = 1..)]
    images: Vec<PathBuf>,

    /// Service base URL (overrides the config file)
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Action {
    Health,
    Metadata,
    Batch,
    Forensics,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let Some(action) = cli.action else {
        anyhow::bail!("No action specified. Use --action health|metadata|batch|forensics.");
    };

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.client.base_url = url;
    }
    if cli.compact {
        config.output.pretty = false;
    }

    let client = ForensicsClient::from_config(config.client.clone())?;
    let pretty = config.output.pretty;

    match action {
        Action::Health => {
            log::info!("Checking service health at {}", client.base_url());
            let result = client.check_health().await;
            print_result(&result, pretty);
        }
        Action::Metadata => {
            let Some(path) = cli.image else {
                anyhow::bail!("--image is required to extract metadata");
            };
            log::info!("Extracting metadata from {}", path.display());
            let result = client.extract_metadata_file(&path).await;
            print_result(&result, pretty);
        }
        Action::Batch => {
            if cli.images.is_empty() {
                anyhow::bail!("--images is required for batch metadata extraction");
            }
            let images = image::collect_images(&cli.images);
            if images.is_empty() {
                anyhow::bail!("No supported image files found in the specified paths.");
            }
            log::info!("Extracting metadata from {} image(s)", images.len());
            let result = client.batch_extract_metadata_files(&images).await;
            print_result(&result, pretty);
        }
        Action::Forensics => {
            let Some(path) = cli.image else {
                anyhow::bail!("--image is required for forensics analysis");
            };
            log::info!("Running forensics analysis on {}", path.display());
            let result = client.analyze_forensics_file(&path).await;
            print_result(&result, pretty);
            print_verdict(&result);
        }
    }

    Ok(())
}

fn print_result(result: &ApiResult, pretty: bool) {
    println!("{}", report::render_result(result, pretty));
}

/// Print the tamper verdict after the raw forensics JSON.
fn print_verdict(result: &ApiResult) {
    let Ok(payload) = result else {
        return;
    };
    let response: ForensicsResponse = match parse_payload(payload) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("{e}");
            return;
        }
    };

    let lines = report::tamper_summary(&response);
    if lines.is_empty() {
        return;
    }
    println!();
    for line in lines {
        println!("{line}");
    }
}
