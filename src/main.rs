// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use crate::app_config::{Config, NarrationProvider, SelectionMode};
use app_controller::{Controller, RunOutcome};

mod app_config;
mod app_controller;
mod captions;
mod compositor;
mod content;
mod errors;
mod file_utils;
mod media;
mod narration;
mod sanitize;
mod segmenter;
mod selection;
mod sources;
mod timeline;

/// CLI Wrapper for NarrationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliNarrationProvider {
    StreamElements,
    Piper,
    Mock,
}

impl From<CliNarrationProvider> for NarrationProvider {
    fn from(cli_provider: CliNarrationProvider) -> Self {
        match cli_provider {
            CliNarrationProvider::StreamElements => NarrationProvider::StreamElements,
            CliNarrationProvider::Piper => NarrationProvider::Piper,
            CliNarrationProvider::Mock => NarrationProvider::Mock,
        }
    }
}

/// CLI Wrapper for SelectionMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSelectionMode {
    Story,
    Comment,
}

impl From<CliSelectionMode> for SelectionMode {
    fn from(cli_mode: CliSelectionMode) -> Self {
        match cli_mode {
            CliSelectionMode::Story => SelectionMode::Story,
            CliSelectionMode::Comment => SelectionMode::Comment,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Produce one narrated story video (default command)
    Produce(ProduceArgs),

    /// Generate shell completions for storycast
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ProduceArgs {
    /// Thread id to produce instead of scanning listings
    #[arg(value_name = "THREAD_ID")]
    thread_id: Option<String>,

    /// Re-produce a thread that already has a finished video
    #[arg(short, long)]
    force: bool,

    /// Narration provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliNarrationProvider>,

    /// Subreddit to pull candidate threads from
    #[arg(short, long)]
    subreddit: Option<String>,

    /// Selection mode (story body or single comment)
    #[arg(short, long, value_enum)]
    mode: Option<CliSelectionMode>,

    /// Output directory for finished videos
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// storycast - Story Narration Video Generator
///
/// Picks one suitable thread (or a single comment from one), narrates it
/// with a TTS engine and composes a caption-synchronized video over a
/// looping background.
#[derive(Parser, Debug)]
#[command(name = "storycast")]
#[command(version = "1.0.0")]
#[command(about = "Automated story narration video generator")]
#[command(long_about = "storycast selects one unit of text from a thread, narrates it and
assembles a caption-synchronized video.

EXAMPLES:
    storycast                                # Scan listings using conf.json
    storycast 1abcd2                         # Produce a specific thread
    storycast -f 1abcd2                      # Re-produce an already-done thread
    storycast -m comment                     # Narrate a single comment instead
    storycast -p piper -s AskReddit          # Local TTS from a given subreddit
    storycast --log-level debug              # Verbose candidate scanning
    storycast completions bash > sc.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different config file with --config-path. If the config file doesn't
    exist, a default one will be created automatically.

SUPPORTED PROVIDERS:
    streamelements - Hosted TTS (default voice: Brian)
    piper          - Local Piper TTS (requires narration.model_path)
    mock           - Synthetic engine for dry runs and tests")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Thread id to produce instead of scanning listings
    #[arg(value_name = "THREAD_ID")]
    thread_id: Option<String>,

    /// Re-produce a thread that already has a finished video
    #[arg(short, long)]
    force: bool,

    /// Narration provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliNarrationProvider>,

    /// Subreddit to pull candidate threads from
    #[arg(short, long)]
    subreddit: Option<String>,

    /// Selection mode (story body or single comment)
    #[arg(short, long, value_enum)]
    mode: Option<CliSelectionMode>,

    /// Output directory for finished videos
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    // Level checks go through log::max_level so a later config override
    // takes effect without re-installing the logger.
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info).map_err(|e| anyhow!("Failed to set logger: {}", e))?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "storycast", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Produce(args)) => run_produce(args).await,
        None => {
            // Default behavior - use top-level args
            let produce_args = ProduceArgs {
                thread_id: cli.thread_id,
                force: cli.force,
                provider: cli.provider,
                subreddit: cli.subreddit,
                mode: cli.mode,
                output_dir: cli.output_dir,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_produce(produce_args).await
        }
    }
}

async fn run_produce(args: ProduceArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config_path);
    if !config_path.exists() {
        Config::create_default_file(&config_path)?;
        info!("Created default configuration at {}", config_path.display());
    }
    let mut config = Config::from_file(&config_path)?;

    // CLI options override the file
    if let Some(provider) = args.provider {
        config.narration.provider = provider.into();
    }
    if let Some(subreddit) = args.subreddit {
        config.source.subreddit = subreddit;
    }
    if let Some(mode) = args.mode {
        config.selection.mode = mode.into();
    }
    if let Some(output_dir) = args.output_dir {
        config.video.output_dir = output_dir.to_string_lossy().to_string();
    }
    if let Some(level) = args.log_level {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    config.validate()?;

    let controller = Controller::with_config(config)?;
    match controller.run(args.thread_id, args.force).await? {
        RunOutcome::Produced(path) => {
            info!("Done: {}", path.display());
            Ok(())
        }
        RunOutcome::NothingToDo => {
            info!("Nothing to produce this run");
            Ok(())
        }
    }
}
