// SPDX-License-Identifier: GPL-3.0-only

use boardscan::backends::camera::FacingMode;
use boardscan::pipelines::photo::Viewport;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "boardscan")]
#[command(about = "Capture board photos with an overlay, keep a gallery, export selections")]
#[command(version = boardscan::constants::app_version())]
struct Cli {
    /// Config file (default: <config dir>/boardscan/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a photo from an image file acting as the camera
    Capture {
        /// Image served as the camera stream
        #[arg(short, long)]
        source: PathBuf,

        /// Which way the virtual camera faces (user or environment)
        #[arg(short, long, default_value = "environment")]
        facing: FacingMode,

        /// Overlay to select before capturing (`none` to remove)
        #[arg(short, long)]
        overlay: Option<String>,

        /// Viewport size as WIDTHxHEIGHT (default from config)
        #[arg(long, value_parser = parse_viewport)]
        viewport: Option<Viewport>,
    },

    /// List photos in the gallery
    List,

    /// List configured overlays
    Overlays,

    /// Select an overlay (`none` to remove it)
    Overlay { id: String },

    /// Toggle the selection of photos directly
    Select {
        #[arg(required = true)]
        indices: Vec<usize>,
    },

    /// Activate a thumbnail like a tap (toggle) or double tap (view)
    Tap {
        index: usize,

        #[arg(short, long)]
        double: bool,
    },

    /// Write one photo to a PNG file
    View {
        index: usize,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Delete the selected photos
    Delete {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every photo
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Export the selected photos as a ZIP archive
    Export {
        /// Archive name (`.zip` is appended)
        #[arg(short, long, default_value = "")]
        name: String,

        /// Directory to save into (default: downloads directory)
        #[arg(short, long, conflicts_with = "pick")]
        output: Option<PathBuf>,

        /// Choose the destination with a save dialog
        #[arg(long)]
        pick: bool,
    },

    /// Send the single selected photo to the AI/OCR service
    Process {
        /// Service URL (default from config)
        #[arg(short, long)]
        endpoint: Option<String>,
    },
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let height = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    Ok(Viewport::new(width, height))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=boardscan=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Capture {
            source,
            facing,
            overlay,
            viewport,
        } => cli::capture(config, &source, facing, overlay, viewport).await,
        Commands::List => cli::list_photos(config),
        Commands::Overlays => cli::list_overlays(config),
        Commands::Overlay { id } => cli::select_overlay(config, &id).await,
        Commands::Select { indices } => cli::toggle_selection(config, &indices).await,
        Commands::Tap { index, double } => cli::tap(config, index, double).await,
        Commands::View { index, output } => cli::view(config, index, &output).await,
        Commands::Delete { yes } => cli::delete_selected(config, yes).await,
        Commands::Clear { yes } => cli::delete_all(config, yes).await,
        Commands::Export { name, output, pick } => cli::export(config, name, output, pick).await,
        Commands::Process { endpoint } => cli::process(config, endpoint).await,
    }
}
