//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serialnorm_core::corpus::{DirectorySink, DirectorySource};
use serialnorm_core::pipeline::{BatchConfig, BatchResult, ProgressReporter, run_batch};
use serialnorm_normalize::Normalizer;
use serialnorm_shared::{AppConfig, ChapterInput, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// serialnorm: clean up web-serial chapters into consistent Markdown.
#[derive(Parser)]
#[command(
    name = "serialnorm",
    version,
    about = "Normalize reddit-serialized fiction chapters into clean Markdown.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.serialnorm/serialnorm.toml).
    #[arg(long, global = true, env = "SERIALNORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Normalize a single raw chapter file and print it to stdout.
    Normalize {
        /// Raw chapter Markdown file.
        file: PathBuf,

        /// 1-based chapter index.
        #[arg(long)]
        index: u32,

        /// Post title to fall back on when the text has no title line.
        #[arg(long)]
        title: Option<String>,

        /// Print the processing report as JSON on stderr.
        #[arg(long)]
        report: bool,
    },

    /// Normalize a raw corpus directory into an output directory.
    Run {
        /// Raw corpus directory (with manifest.json).
        #[arg(long)]
        raw: PathBuf,

        /// Output directory for normalized chapters.
        #[arg(long)]
        out: PathBuf,

        /// Re-normalize chapters even when unchanged since the last run.
        #[arg(long)]
        force: bool,

        /// Delete outputs of chapters no longer in the raw corpus.
        #[arg(long)]
        prune: bool,

        /// Chapters normalized concurrently (overrides the config file).
        #[arg(long)]
        workers: Option<usize>,

        /// Exit non-zero if any chapter failed or needs review.
        #[arg(long)]
        strict: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so `normalize`
/// output on stdout stays clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "serialnorm=info",
        1 => "serialnorm=debug",
        _ => "serialnorm=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Normalize {
            file,
            index,
            title,
            report,
        } => cmd_normalize(config_path, &file, index, title, report).await,
        Command::Run {
            raw,
            out,
            force,
            prune,
            workers,
            strict,
        } => {
            let options = RunOptions {
                force,
                prune,
                workers,
                strict,
            };
            cmd_run(config_path, &raw, &out, options).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path).await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_normalize(
    config_path: Option<&Path>,
    file: &Path,
    index: u32,
    title: Option<String>,
    report: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let normalizer = Normalizer::from_config(&config)?;

    let raw = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;

    let mut input = ChapterInput::new(raw, index);
    if let Some(title) = title {
        input = input.with_fallback_title(title);
    }

    let chapter = normalizer.normalize(&input)?;
    println!("{}", chapter.text);

    if report {
        eprintln!("{}", serde_json::to_string_pretty(&chapter.report)?);
    }
    Ok(())
}

struct RunOptions {
    force: bool,
    prune: bool,
    workers: Option<usize>,
    strict: bool,
}

async fn cmd_run(config_path: Option<&Path>, raw: &Path, out: &Path, options: RunOptions) -> Result<()> {
    let config = resolve_config(config_path)?;

    let mut batch = BatchConfig::from_config(&config)?;
    batch.force = options.force;
    batch.prune = options.prune;
    if let Some(workers) = options.workers {
        if workers == 0 {
            return Err(eyre!("--workers must be at least 1"));
        }
        batch.workers = workers;
    }

    let source = DirectorySource::open(raw)?;
    let sink = DirectorySink::create(out)?;

    info!(
        raw = %source.root().display(),
        out = %sink.root().display(),
        workers = batch.workers,
        force = batch.force,
        prune = batch.prune,
        "normalizing corpus"
    );

    let reporter = CliProgress::new();
    let result = run_batch(&batch, &source, &sink, &reporter).await?;

    println!();
    println!("  Series:       {}", result.series);
    println!("  Run:          {}", result.run_id);
    println!("  Written:      {}", result.written);
    println!("  Unchanged:    {}", result.unchanged);
    println!("  Removed:      {}", result.removed);
    println!("  Warnings:     {}", result.warnings);
    println!("  Needs review: {}", format_indices(&result.needs_review));
    println!("  Failed:       {}", result.failures.len());
    for failure in &result.failures {
        println!(
            "    chapter {} ({}): {}",
            failure.index, failure.source_filename, failure.error
        );
    }
    println!("  Output:       {}", sink.root().display());
    println!("  Time:         {:.1}s", result.elapsed.as_secs_f64());
    println!();

    if options.strict && (!result.failures.is_empty() || !result.needs_review.is_empty()) {
        return Err(eyre!(
            "{} chapter(s) failed, {} need review",
            result.failures.len(),
            result.needs_review.len()
        ));
    }
    Ok(())
}

fn format_indices(indices: &[u32]) -> String {
    if indices.is_empty() {
        return "none".to_string();
    }
    indices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

async fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, toml::to_string_pretty(&AppConfig::default())?)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn chapter_done(&self, index: u32, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Normalizing [{current}/{total}] chapter {index}"));
    }

    fn done(&self, _result: &BatchResult) {
        self.spinner.finish_and_clear();
    }
}
