//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use pdfharvest_core::pipeline::{self, HarvestReport, Phase, PhaseReport, ProgressReporter};
use pdfharvest_shared::{AppConfig, HarvestConfig, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pdfharvest: download vendor PDF manuals in bulk.
#[derive(Parser)]
#[command(
    name = "pdfharvest",
    version,
    about = "Collect PDF links from a vendor search API and web pages, then download them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.pdfharvest/pdfharvest.toml.
    #[arg(long, env = "PDFHARVEST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

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
    /// Fetch candidates and download PDFs.
    Run {
        /// Output directory (defaults to the config's output_dir).
        #[arg(short, long)]
        out: Option<String>,

        /// Skip the search API phase.
        #[arg(long)]
        skip_search: bool,

        /// Skip the HTML page phase.
        #[arg(long)]
        skip_pages: bool,
    },

    /// Print the candidate URLs of both phases without downloading.
    List,

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

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pdfharvest=info",
        1 => "pdfharvest=debug",
        _ => "pdfharvest=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Run {
            out,
            skip_search,
            skip_pages,
        } => {
            let app = resolve_config(config_path.as_deref())?;
            let config = harvest_config(&app, out.as_deref(), skip_search, skip_pages);
            cmd_run(&config).await
        }
        Command::List => {
            let app = resolve_config(config_path.as_deref())?;
            cmd_list(&HarvestConfig::from(&app)).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

/// Load the config from `path` if given, else from the default location.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Merge CLI flags over the loaded config.
fn harvest_config(
    app: &AppConfig,
    out: Option<&str>,
    skip_search: bool,
    skip_pages: bool,
) -> HarvestConfig {
    let mut config = HarvestConfig::from(app);
    if let Some(out) = out {
        config.output_dir = PathBuf::from(out);
    }
    if skip_search {
        config.search = None;
    }
    if skip_pages {
        config.pages.clear();
    }
    config
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config: &HarvestConfig) -> Result<()> {
    info!(
        output_dir = %config.output_dir.display(),
        search = config.search.is_some(),
        pages = config.pages.len(),
        "harvesting PDFs"
    );

    let reporter = CliProgress::new();
    let report = pipeline::harvest(config, &reporter).await?;

    println!();
    for line in summary_lines(&report, &config.output_dir) {
        println!("{line}");
    }
    println!();

    Ok(())
}

/// Human-readable summary of a finished run.
fn summary_lines(report: &HarvestReport, output_dir: &Path) -> Vec<String> {
    vec![
        "  Harvest finished.".to_string(),
        format!("  Run:        {}", report.run_id),
        format!(
            "  Started:    {}",
            report.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        phase_line("Search API", &report.search),
        phase_line("Pages", &report.pages),
        format!("  Output:     {}", output_dir.display()),
        format!("  Time:       {:.1}s", report.elapsed.as_secs_f64()),
    ]
}

fn phase_line(label: &str, report: &PhaseReport) -> String {
    let cap = if report.cap_reached { " (limit reached)" } else { "" };
    format!(
        "  {label:<11} {} downloaded, {} already present, {} failed, {} skipped{cap}",
        report.downloaded.len(),
        report.already_present,
        report.failed,
        report.skipped,
    )
}

async fn cmd_list(config: &HarvestConfig) -> Result<()> {
    let listing = pipeline::list_candidates(config).await?;

    println!("# search API ({})", listing.search.len());
    for candidate in &listing.search {
        println!("{candidate}");
    }
    println!("# pages ({})", listing.pages.len());
    for candidate in &listing.pages {
        println!("{candidate}");
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn candidates_found(&self, phase: Phase, count: usize) {
        self.spinner
            .set_message(format!("{phase}: {count} candidates"));
    }

    fn download_started(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Downloading [{current}/{total}] {url}"));
    }

    fn done(&self, _report: &HarvestReport) {
        self.spinner.finish_and_clear();
    }
}
