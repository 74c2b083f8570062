// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error};

use dualsub::aligner::AlignmentStrategy;
use dualsub::app_config::{self, Config};
use dualsub::file_utils::FileManager;
use dualsub::Controller;

/// CLI Wrapper for AlignmentStrategy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliAlignmentStrategy {
    Auto,
    Positional,
    Overlap,
}

impl From<CliAlignmentStrategy> for AlignmentStrategy {
    fn from(cli_strategy: CliAlignmentStrategy) -> Self {
        match cli_strategy {
            CliAlignmentStrategy::Auto => AlignmentStrategy::Auto,
            CliAlignmentStrategy::Positional => AlignmentStrategy::Positional,
            CliAlignmentStrategy::Overlap => AlignmentStrategy::Overlap,
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

/// Options shared by every command
#[derive(Args, Debug, Clone)]
struct CommonOptions {
    /// Configuration file path (defaults are used when it does not exist)
    #[arg(short, long, global = true, default_value = "dualsub.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Force the input encoding (e.g. 'utf-8', 'gbk', 'big5') instead of detecting it
    #[arg(short, long, global = true)]
    encoding: Option<String>,

    /// Abort when more than this share (0.0-1.0) of blocks is unparseable
    #[arg(long, global = true)]
    anomaly_threshold: Option<f64>,
}

/// Options controlling the merge itself
#[derive(Args, Debug, Clone, Default)]
struct MergeFlags {
    /// Alignment strategy
    #[arg(short, long, value_enum)]
    strategy: Option<CliAlignmentStrategy>,

    /// Remove original text echoed inside the translation
    #[arg(long)]
    clean_translation: bool,

    /// Join multi-line original text onto one line
    #[arg(long)]
    collapse_original: bool,

    /// Refuse to replace an existing output file
    #[arg(short, long)]
    no_clobber: bool,

    /// Also write the conversion report as JSON to this path
    #[arg(long, value_name = "PATH")]
    report_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Original-language subtitle file
    #[arg(value_name = "ORIGINAL")]
    original: PathBuf,

    /// Translated subtitle file
    #[arg(value_name = "TRANSLATED")]
    translated: PathBuf,

    /// Output file (default: translated name with '.bilingual' before the extension)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    flags: MergeFlags,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge an original and a translated subtitle file (default command)
    Merge(MergeArgs),

    /// Check whether two subtitle files line up, without writing anything
    Check {
        /// Original-language subtitle file
        #[arg(value_name = "ORIGINAL")]
        original: PathBuf,

        /// Translated subtitle file
        #[arg(value_name = "TRANSLATED")]
        translated: PathBuf,
    },

    /// Generate shell completions for dualsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// dualsub - bilingual subtitle merger
///
/// Combines an original-language SRT file and its translation into one
/// bilingual SRT file, original line first, translation below.
#[derive(Parser, Debug)]
#[command(name = "dualsub")]
#[command(version)]
#[command(about = "Merge original and translated subtitles into one bilingual SRT file")]
#[command(long_about = "dualsub pairs the entries of an original SRT file with those of a translated SRT file and writes one bilingual SRT file.

EXAMPLES:
    dualsub movie.en.srt movie.zh.srt                     # Writes movie.zh.bilingual.srt
    dualsub movie.en.srt movie.zh.srt out.srt             # Explicit output path
    dualsub -s overlap movie.en.srt movie.zh.srt          # Align by time overlap
    dualsub -e gbk movie.en.srt movie.zh.srt              # Force the input encoding
    dualsub check movie.en.srt movie.zh.srt               # Compare indices and timings
    dualsub completions bash > dualsub.bash               # Generate bash completions

EXIT STATUS:
    0 on success, 1 on any failure (unreadable, undecodable or unparseable
    input, alignment abort, or output write failure).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Original-language subtitle file
    #[arg(value_name = "ORIGINAL")]
    original: Option<PathBuf>,

    /// Translated subtitle file
    #[arg(value_name = "TRANSLATED")]
    translated: Option<PathBuf>,

    /// Output file (default: translated name with '.bilingual' before the extension)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    flags: MergeFlags,

    #[command(flatten)]
    common: CommonOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level.max(log::max_level())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                colour, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> ExitCode {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config if needed
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: CommandLineOptions) -> Result<u8> {
    // If log level is set via command line, apply it immediately
    if let Some(level) = &cli.common.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "dualsub", &mut std::io::stdout());
            Ok(0)
        }
        Some(Commands::Check { original, translated }) => {
            let config = load_config(&cli.common, &MergeFlags::default())?;
            let controller = Controller::with_config(config)?;
            let report = controller
                .check(&original, &translated)
                .context("Compatibility check failed")?;
            print!("{}", report);
            Ok(report.exit_code() as u8)
        }
        Some(Commands::Merge(args)) => run_merge(args, &cli.common),
        None => {
            // Default behavior - top-level positional arguments
            let original = cli
                .original
                .ok_or_else(|| anyhow!("ORIGINAL is required when no subcommand is specified"))?;
            let translated = cli
                .translated
                .ok_or_else(|| anyhow!("TRANSLATED is required when no subcommand is specified"))?;

            let args = MergeArgs {
                original,
                translated,
                output: cli.output,
                flags: cli.flags,
            };
            run_merge(args, &cli.common)
        }
    }
}

fn run_merge(args: MergeArgs, common: &CommonOptions) -> Result<u8> {
    let config = load_config(common, &args.flags)?;
    let controller = Controller::with_config(config)?;

    let report = controller.run(&args.original, &args.translated, args.output.as_deref());
    print!("{}", report);

    if let Some(json_path) = &args.flags.report_json {
        let json = report
            .to_json()
            .context("Failed to serialize conversion report")?;
        FileManager::write_atomic(json_path, &json)
            .with_context(|| format!("Failed to write report to {}", json_path.display()))?;
    }

    Ok(report.exit_code() as u8)
}

/// Load the configuration file and apply command line overrides
fn load_config(common: &CommonOptions, flags: &MergeFlags) -> Result<Config> {
    let mut config = Config::load_or_default(&common.config_path)?;

    if let Some(log_level) = &common.log_level {
        config.log_level = log_level.clone().into();
    } else {
        // Just update the max level without reinitializing the logger
        log::set_max_level(config.log_level.to_level_filter());
    }

    if let Some(label) = &common.encoding {
        config.parsing.encoding = Some(label.clone());
    }

    if let Some(threshold) = common.anomaly_threshold {
        config.parsing.anomaly_threshold = threshold;
    }

    if let Some(strategy) = &flags.strategy {
        config.alignment.strategy = strategy.clone().into();
    }

    config.merge.clean_translation |= flags.clean_translation;
    config.merge.collapse_original |= flags.collapse_original;
    if flags.no_clobber {
        config.output.overwrite = false;
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}
