#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use xliffwai::app_config::{self, Config, TranslationProvider};
use xliffwai::app_controller::{Controller, FileOutcome};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
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
    /// Translate XLIFF files using AI providers (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for xliffwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input XLIFF file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output file (single file mode only; defaults to <stem>.<target>.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'en-US')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'fr', 'pt-BR')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Unit ids to leave untranslated, comma separated (added to the config's ignore_list)
    #[arg(short, long, value_delimiter = ',')]
    ignore: Vec<String>,

    /// Keep targets that are already present
    #[arg(short, long)]
    keep_existing: bool,

    /// Maximum number of concurrent translation requests
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", env = "XLIFFWAI_CONFIG")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Check that the provider is reachable before translating
    #[arg(long)]
    check_connection: bool,
}

/// xliffwai - XLIFF translation with AI
///
/// Fills in the <target> of every translation unit in XLIFF files using
/// AI providers (Ollama, OpenAI, Anthropic, LM Studio).
#[derive(Parser, Debug)]
#[command(name = "xliffwai")]
#[command(version)]
#[command(about = "AI-powered XLIFF translation tool")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "xliffwai translates the source of every XLIFF translation unit and writes it as the unit's target.

EXAMPLES:
    xliffwai messages.xlf                          # Translate using default config
    xliffwai -t de messages.xlf                    # Translate to German
    xliffwai -f -o out/messages.de.xlf messages.xlf
    xliffwai -i app.title,app.version messages.xlf # Leave two units untranslated
    xliffwai -p openai -m gpt-4o-mini locales/     # Process a whole directory
    xliffwai completions bash > xliffwai.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server
    openai    - OpenAI API (requires API key or OPENAI_API_KEY)
    anthropic - Anthropic API (requires API key or ANTHROPIC_API_KEY)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

/// Logger writing colored, timestamped lines to stderr
struct CustomLogger;

impl CustomLogger {
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    // Filtering follows log::max_level, which is raised or lowered once the config is known
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, emoji) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "xliffwai", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    }
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    for id in options.ignore.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !config.ignore_list.iter().any(|existing| existing == id) {
            config.ignore_list.push(id.to_string());
        }
    }

    if options.keep_existing {
        config.xliff.keep_existing_targets = true;
    }

    if let Some(concurrency) = options.concurrency {
        config.xliff.max_concurrent_requests = Some(concurrency);
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // Apply the command line level right away so config loading is logged at that level
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let input_path = options.input_path.clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required"))?;

    let (mut config, created) = Config::load_or_create(&options.config_path)?;
    if created {
        warn!("Config file not found at '{}', created default config.", options.config_path.display());
    }

    apply_overrides(&mut config, &options);

    config.validate()
        .context("Configuration validation failed")?;

    log::set_max_level(config.log_level.to_level_filter());

    info!(
        "Translating from {} to {} with {} ({})",
        config.source_language,
        config.target_language,
        config.translation.provider.display_name(),
        config.translation.get_model()
    );

    if options.check_connection {
        xliffwai::TranslationService::new(config.translation.clone())?
            .test_connection()
            .await?;
    }

    let controller = Controller::with_config(config)?;

    if input_path.is_file() {
        match controller.run(input_path, options.output, options.force_overwrite).await? {
            FileOutcome::Translated { output_path, .. } => info!("Wrote {}", output_path.display()),
            FileOutcome::Skipped { output_path } => info!("Kept existing {}", output_path.display()),
        }
    } else if input_path.is_dir() {
        if options.output.is_some() {
            return Err(anyhow!("--output cannot be used when INPUT_PATH is a directory"));
        }
        let summary = controller.run_folder(input_path, options.force_overwrite).await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} file(s) failed to translate", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", Path::new(&input_path)));
    }

    Ok(())
}
