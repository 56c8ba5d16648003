// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use cosmic::cosmic_config::{self, CosmicConfigEntry};
use scanner::app::AppModel;
use scanner::backends::camera::CameraBackendType;
use scanner::constants::ui;
use scanner::{Config, i18n};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "scanner")]
#[command(about = "Barcode and QR code scanner for the COSMIC desktop")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in terminal mode (renders camera to terminal)
    Terminal,

    /// List available cameras
    List {
        /// Backend to enumerate (defaults to the configured one)
        #[arg(short, long, value_parser = parse_backend)]
        backend: Option<CameraBackendType>,
    },

    /// Scan a single code and print it
    Scan {
        /// Camera index to use (from 'scanner list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Give up after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode codes from an image file
    Decode {
        /// Image to decode
        image: PathBuf,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_backend(value: &str) -> Result<CameraBackendType, String> {
    match value.to_ascii_lowercase().as_str() {
        "pipewire" => Ok(CameraBackendType::PipeWire),
        "v4l2" => Ok(CameraBackendType::V4l2),
        other => Err(format!("unknown backend '{}' (expected pipewire or v4l2)", other)),
    }
}

/// Load the stored configuration, falling back to defaults
fn load_config() -> Config {
    use cosmic::Application;

    match cosmic_config::Config::new(AppModel::APP_ID, Config::VERSION) {
        Ok(handler) => Config::get_entry(&handler).unwrap_or_else(|(errors, config)| {
            tracing::warn!(?errors, "Errors loading config");
            config
        }),
        Err(err) => {
            tracing::warn!(%err, "No config handler, using defaults");
            Config::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();

    // Enable localizations to be applied.
    i18n::init(&requested_languages);

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Terminal) => scanner::terminal::run(load_config()),
        Some(Commands::List { backend }) => {
            cli::list_cameras(backend.unwrap_or(load_config().backend))
        }
        Some(Commands::Scan {
            camera,
            timeout,
            json,
        }) => cli::scan(&load_config(), camera, timeout, json),
        Some(Commands::Decode { image, json }) => cli::decode_image(&image, json),
        None => run_gui(),
    }
}

fn run_gui() -> Result<(), Box<dyn std::error::Error>> {
    // Settings for configuring the application window and iced runtime.
    let settings = cosmic::app::Settings::default().size_limits(
        cosmic::iced::Limits::NONE
            .min_width(ui::MIN_WINDOW_WIDTH)
            .min_height(ui::MIN_WINDOW_HEIGHT),
    );

    // Starts the application's event loop with `()` as the application's flags.
    cosmic::app::run::<AppModel>(settings, ())?;

    Ok(())
}
