//! Tilawa - Quran recitation downloader and video renderer
//!
//! Entry point: sets up logging, loads configuration and dispatches the
//! fetch, render and reciters commands.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{error, info, Level};
use tracing_appender::non_blocking;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tilawa::align::{ContentPaths, load_content};
use tilawa::catalog::Catalog;
use tilawa::cli::{Args, Commands, prompt_fetch_request};
use tilawa::config::{Config, LoggingConfig, Orientation};
use tilawa::fetch::{Fetcher, HttpArchive};
use tilawa::workflow::Workflow;

const DEFAULT_CONFIG: &str = "tilawa.toml";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Setup logging to both console and file
    if let Err(e) = setup_logging(args.verbose, &config.logging) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args.command, config).await {
        error!("Run aborted: {:?}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Fetch { surah, reciter, limit } => {
            let catalog = Catalog::from_file(&config.catalog.path)?;
            let request = prompt_fetch_request(surah, reciter, limit)?;

            let archive = HttpArchive::new(&config.archive)?;
            let fetcher = Fetcher::new(&catalog, &archive, &config.archive);
            let report = fetcher.fetch(&request).await?;

            info!(
                "Fetch finished: {} downloaded, {} already present in {}",
                report.downloaded,
                report.skipped,
                report.folder.display()
            );
        }
        Commands::Render {
            audio_dir,
            surah,
            script,
            translation,
            background,
            output,
            orientation,
            width,
            height,
        } => {
            if let Some(orientation) = orientation {
                let (w, h) = orientation.parse::<Orientation>()?.dimensions();
                config.video.width = w;
                config.video.height = h;
            }
            if let Some(width) = width {
                config.video.width = width;
            }
            if let Some(height) = height {
                config.video.height = height;
            }
            config.validate()?;

            let audio_dir = audio_dir.unwrap_or_else(|| config.content.audio_dir.clone());
            let script = script.unwrap_or_else(|| config.content.script_path.clone());
            let translation = translation.unwrap_or_else(|| config.content.translation_path.clone());
            let background = background.unwrap_or_else(|| config.video.background.clone());
            let output = output.unwrap_or_else(|| config.video.output.clone());

            let content = load_content(
                &ContentPaths {
                    audio_dir: &audio_dir,
                    script: &script,
                    translation: &translation,
                },
                surah,
            )?;

            let workflow = Workflow::new(config)?;
            let report = workflow.create_video(&content, &background, &output).await?;

            info!(
                "Rendered {} verses ({:.1}s) to {}",
                report.verses,
                report.duration,
                report.output.display()
            );
        }
        Commands::Reciters => {
            let catalog = Catalog::from_file(&config.catalog.path)?;

            println!("\nAvailable Reciters:");
            println!("{:<6} {:<45} {:<10}", "Id", "Subfolder", "Bitrate");
            println!("{}", "-".repeat(63));
            for (id, reciter) in catalog.reciters() {
                println!(
                    "{:<6} {:<45} {:<10}",
                    id,
                    reciter.subfolder,
                    reciter.bitrate.as_deref().unwrap_or("-")
                );
            }
        }
    }

    info!("Tilawa completed successfully");
    Ok(())
}

/// Explicit file, else tilawa.toml in the working directory, else defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => Config::from_file(DEFAULT_CONFIG)?,
        None => Config::default(),
    };
    Ok(config)
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let log_file = logging.create_log_file()?;
    let (non_blocking_file, guard) = non_blocking(log_file);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber.try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, logging.log_path().display());

    Ok(())
}
