//! recycle-lens command line.

use clap::{Args, Parser, Subcommand};
use recycle_lens_lib::commands::classifier::{ClassifierScreen, ConsoleNotifier};
use recycle_lens_lib::commands::payload;
use recycle_lens_lib::config::{self, DeviceConfig, PipelineConfig};
use recycle_lens_lib::models::capture_types::EncodeOptions;
use recycle_lens_lib::services::picker::{
    CommandCamera, DesktopPicker, DirectoryLibrary, Library,
};
use recycle_lens_lib::{Orchestrator, PipelineError, PipelineResult};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "recycle-lens")]
#[command(version)]
#[command(about = "Classify the recyclable material in a photo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture or pick a photo and classify it
    Classify(ClassifyArgs),
    /// Encode a photo as it would be sent and report the payload size
    Encode(EncodeArgs),
}

#[derive(Args)]
struct EncodeSettings {
    /// Encoded width in pixels
    #[arg(long, env = "RECYCLE_LENS_TARGET_WIDTH", default_value_t = config::DEFAULT_TARGET_SIZE)]
    width: u32,
    /// Encoded height in pixels
    #[arg(long, env = "RECYCLE_LENS_TARGET_HEIGHT", default_value_t = config::DEFAULT_TARGET_SIZE)]
    height: u32,
    /// JPEG quality (1-100)
    #[arg(long, env = "RECYCLE_LENS_JPEG_QUALITY", default_value_t = config::DEFAULT_JPEG_QUALITY)]
    quality: u8,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Take a photo with the configured camera command
    #[arg(long, conflicts_with = "gallery")]
    camera: bool,
    /// Pick a photo from the library (default)
    #[arg(long)]
    gallery: bool,
    /// Use this file instead of prompting for a library pick
    #[arg(long, conflicts_with = "camera")]
    image: Option<PathBuf>,
    /// Classifier endpoint URL
    #[arg(long, env = "RECYCLE_LENS_ENDPOINT")]
    endpoint: String,
    /// Request timeout in seconds; transport defaults when unset
    #[arg(long, env = "RECYCLE_LENS_REQUEST_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
    /// Capture command, `{output}` is replaced with the frame path
    #[arg(long, env = "RECYCLE_LENS_CAMERA_CMD")]
    camera_cmd: Option<String>,
    /// Photo library directory
    #[arg(long, env = "RECYCLE_LENS_LIBRARY_DIR")]
    library_dir: Option<PathBuf>,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    encode: EncodeSettings,
}

#[derive(Args)]
struct EncodeArgs {
    /// Source image
    path: PathBuf,
    /// Also write the encoded JPEG here
    #[arg(long)]
    out: Option<PathBuf>,
    #[command(flatten)]
    encode: EncodeSettings,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("recycle_lens=info,recycle_lens_lib=info,warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Classify(args) => classify(args).await,
        Command::Encode(args) => encode(args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn classify(args: ClassifyArgs) -> PipelineResult<ExitCode> {
    let config = PipelineConfig {
        endpoint: config::parse_endpoint(&args.endpoint)?,
        target_width: args.encode.width,
        target_height: args.encode.height,
        jpeg_quality: args.encode.quality,
        request_timeout: args.timeout_secs.map(Duration::from_secs),
    };

    let devices = DeviceConfig {
        camera_command: args.camera_cmd.filter(|c| !c.trim().is_empty()),
        library_dir: args.library_dir,
    };
    let camera = devices.camera_command.map(CommandCamera::new).transpose()?;
    let library = match (args.image, devices.library_dir) {
        (Some(path), _) => Library::Preset(path),
        (None, Some(dir)) => Library::Directory(DirectoryLibrary::new(dir)),
        (None, None) => {
            let cwd = std::env::current_dir()
                .map_err(|e| PipelineError::config(format!("no working directory: {}", e)))?;
            Library::Directory(DirectoryLibrary::new(cwd))
        }
    };

    let orchestrator = Arc::new(Orchestrator::new(config, DesktopPicker::new(camera, library))?);
    info!(endpoint = %orchestrator.config().endpoint, "classifier configured");
    let screen = ClassifierScreen::new(orchestrator, ConsoleNotifier);

    let use_camera = args.camera && !args.gallery;
    let state = if use_camera {
        screen.take_photo().await
    } else {
        screen.select_from_gallery().await
    };

    if args.json {
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| PipelineError::config(format!("Failed to serialize result: {}", e)))?;
        println!("{}", json);
    } else if state.is_idle() && state.last_failure.is_none() {
        println!("No image selected");
    } else {
        print!("{}", state.render());
    }

    Ok(if state.last_failure.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn encode(args: EncodeArgs) -> PipelineResult<ExitCode> {
    let options = EncodeOptions {
        target_width: args.encode.width,
        target_height: args.encode.height,
        quality: args.encode.quality,
    };

    let report = payload::inspect_payload(&args.path, options, args.out.as_deref()).await?;
    print!("{}", payload::render_report(&report));
    Ok(ExitCode::SUCCESS)
}
