// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use docxlate::app_config::{Config, LogLevel, TranslationProvider};
use docxlate::language_utils::TargetLanguage;
use docxlate::{ConcurrencyMode, Controller, ReplacementPolicy};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Google,
    #[value(name = "libretranslate", alias = "libre")]
    LibreTranslate,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Google => TranslationProvider::Google,
            CliTranslationProvider::LibreTranslate => TranslationProvider::LibreTranslate,
        }
    }
}

/// CLI Wrapper for ReplacementPolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliPolicy {
    WholeUnit,
    FirstRun,
    PerRun,
}

impl From<CliPolicy> for ReplacementPolicy {
    fn from(cli_policy: CliPolicy) -> Self {
        match cli_policy {
            CliPolicy::WholeUnit => ReplacementPolicy::WholeUnit,
            CliPolicy::FirstRun => ReplacementPolicy::FirstRun,
            CliPolicy::PerRun => ReplacementPolicy::PerRun,
        }
    }
}

/// CLI Wrapper for ConcurrencyMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliMode {
    Sequential,
    RegionBatched,
    WorkerPool,
}

impl From<CliMode> for ConcurrencyMode {
    fn from(cli_mode: CliMode) -> Self {
        match cli_mode {
            CliMode::Sequential => ConcurrencyMode::Sequential,
            CliMode::RegionBatched => ConcurrencyMode::RegionBatched,
            CliMode::WorkerPool => ConcurrencyMode::WorkerPool,
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

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a Word document or every document in a folder (default command)
    Translate(TranslateArgs),

    /// List the supported target languages
    Languages,

    /// Generate shell completions for docxlate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct TranslateArgs {
    /// Input .docx file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    options: TranslateOptions,
}

#[derive(clap::Args, Debug, Clone)]
struct TranslateOptions {
    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation service to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Source language code (e.g., 'en') or 'auto'
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code or name (e.g., 'hi', 'Tamil')
    #[arg(short, long)]
    target_language: Option<String>,

    /// How translations are written back into the document
    #[arg(long, value_enum)]
    policy: Option<CliPolicy>,

    /// How text is dispatched to the translation service
    #[arg(long, value_enum)]
    mode: Option<CliMode>,

    /// Number of concurrent requests in worker pool mode
    #[arg(long)]
    pool_size: Option<usize>,

    /// Per-call timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Output directory (defaults to the input file's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// docxlate - Word document translation
///
/// Translates the paragraphs and tables of .docx files while keeping their
/// formatting.
#[derive(Parser, Debug)]
#[command(name = "docxlate")]
#[command(args_conflicts_with_subcommands = true)]
#[command(version)]
#[command(about = "Formatting-preserving translation of Word documents")]
#[command(long_about = "docxlate translates the text of Word documents into Indian languages while keeping runs, styles and tables intact.

EXAMPLES:
    docxlate report.docx                          # Translate using default config
    docxlate -t ta report.docx                    # Translate to Tamil
    docxlate -f report.docx                       # Force overwrite existing output
    docxlate --policy whole-unit report.docx      # Rewrite whole paragraphs
    docxlate --mode worker-pool --pool-size 8 docs/   # Translate a folder in parallel
    docxlate languages                            # List target languages
    docxlate completions bash > docxlate.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED SERVICES:
    google          - Google web translate (default)
    libretranslate  - LibreTranslate server (native batch calls)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input .docx file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    options: TranslateOptions,
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
        // The logger itself passes everything; `log::max_level` does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and emoji for a log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌"),
            Level::Warn => ("\x1B[1;33m", "🚧"),
            Level::Info => ("\x1B[1;32m", ""),
            Level::Debug => ("\x1B[1;36m", "🔍"),
            Level::Trace => ("\x1B[1;35m", "📋"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, emoji) = Self::decoration(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "docxlate", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Languages) => {
            list_languages();
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - top-level args
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;
            run_translate(TranslateArgs {
                input_path,
                options: cli.options,
            })
            .await
        }
    }
}

fn list_languages() {
    let mut stdout = std::io::stdout();
    for target in TargetLanguage::ALL {
        let native = target.native_name().unwrap_or("");
        let _ = writeln!(stdout, "{:<4}{:<12}{}", target.code(), target.display_name(), native);
    }
}

// @applies: Command line overrides on top of the configuration file
fn apply_overrides(config: &mut Config, options: &TranslateOptions) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(policy) = &options.policy {
        config.engine.policy = policy.clone().into();
    }
    if let Some(mode) = &options.mode {
        config.engine.mode = mode.clone().into();
    }
    if let Some(pool_size) = options.pool_size {
        config.engine.pool_size = Some(pool_size);
    }
    if let Some(timeout_secs) = options.timeout_secs {
        config.engine.timeout_secs = timeout_secs;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let options = &args.options;

    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, options);
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    info!(
        "🚀 docxlate: {} ({} → {}, {} policy, {} mode)",
        controller.config().translation.provider.display_name(),
        controller.translator().gateway().source_language(),
        controller.translator().gateway().target_language().display_name(),
        controller.translator().options().policy,
        controller.translator().options().mode
    );

    if args.input_path.is_file() {
        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => args.input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };
        controller
            .run(args.input_path.clone(), output_dir, options.force_overwrite)
            .await?;
    } else if args.input_path.is_dir() {
        let summary = controller
            .run_folder(args.input_path.clone(), options.force_overwrite)
            .await?;
        if summary.errors > 0 {
            return Err(anyhow!("{} documents failed to translate", summary.errors));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    Ok(())
}
