//! subpipe - video subtitling pipeline
//!
//! Extracts the audio track of a video, transcribes it with faster-whisper,
//! translates the transcript through ollama and embeds the result with ffmpeg.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use subpipe::cli::Args;
use subpipe::config::{Config, LogFormat, LogRotation, LoggingConfig};
use subpipe::media::MediaProcessorFactory;
use subpipe::transcribe::RecognitionEngineFactory;
use subpipe::translate::TranslationEngineFactory;
use subpipe::workflow::Pipeline;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let (config, guard) = match init(&args) {
        Ok(initialized) => initialized,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args, config).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        // exit() skips destructors, flush the file writer first
        drop(guard);
        std::process::exit(1);
    }
}

/// Load configuration and install logging
fn init(args: &Args) -> Result<(Config, WorkerGuard)> {
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let guard = setup_logging(&config.paths.logs_dir, &config.logging, args.verbose)?;
    Ok((config, guard))
}

async fn run(args: &Args, config: Config) -> Result<()> {
    info!("Starting subpipe");

    let backend = MediaProcessorFactory::create_backend(config.ffmpeg.clone());
    let recognition = RecognitionEngineFactory::create_engine(config.transcription.clone());
    let translation = TranslationEngineFactory::create_engine(&config)?;

    let pipeline = Pipeline::new(
        config,
        Arc::from(backend),
        Arc::from(recognition),
        Arc::from(translation),
    );

    pipeline
        .run(&args.steps, args.mode.map(Into::into), args.video.as_deref())
        .await?;

    println!("Pipeline completed successfully!");
    Ok(())
}

/// Non-blocking writer over the rotating log file; lines are flushed when the guard drops
fn file_writer(log_dir: &Path, logging: &LoggingConfig) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;

    let rotation = match logging.rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    };

    let file_appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(logging.file_name.as_str())
        .max_log_files(logging.max_files.max(1))
        .build(log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create log file appender: {}", e))?;
    Ok(tracing_appender::non_blocking(file_appender))
}

/// Setup logging to both console and a rotating file.
///
/// The returned guard must be held until the program exits.
fn setup_logging(log_dir: &Path, logging: &LoggingConfig, verbose: bool) -> Result<WorkerGuard> {
    let (non_blocking_file, guard) = file_writer(log_dir, logging)?;

    let level = if verbose { "debug" } else { logging.level.as_str() };
    // RUST_LOG wins unless -v was given
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) if !verbose => filter,
        _ => EnvFilter::try_new(level).map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", level, e))?,
    };

    let console_layer = match logging.format {
        LogFormat::Full => fmt::layer().with_target(false).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - level: {}, file: {}",
        level,
        log_dir.join(&logging.file_name).display()
    );
    Ok(guard)
}
