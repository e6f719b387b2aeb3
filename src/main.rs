//! doc-walker main entry point
//!
//! This is the command-line interface: walk a documentation site's "next"
//! links, write the URL list, then convert every page to Markdown.

use anyhow::{bail, Context};
use clap::Parser;
use doc_walker::config::{load_config_with_hash, validate, Config, OracleKind, ReasoningEffort};
use doc_walker::convert::{convert_all_with_cancel, HtmlConverter};
use doc_walker::crawler::{build_driver, build_resumed_driver};
use doc_walker::output::{read_url_list, write_url_list, UrlListWriter};
use std::io;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url::Url;

/// doc-walker: follow a documentation site's "next page" links
///
/// Starting from one page, doc-walker repeatedly finds the link to the
/// next page, records every page in reading order, and converts the
/// collected pages to Markdown.
#[derive(Parser, Debug)]
#[command(name = "doc-walker")]
#[command(version)]
#[command(about = "Walks paginated documentation and converts it to Markdown", long_about = None)]
struct Cli {
    /// First page of the documentation (http or https)
    #[arg(value_name = "START_URL", required_unless_present = "convert_only")]
    start_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the Markdown files
    #[arg(short, long, value_name = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// File receiving the discovered URLs, one per line
    #[arg(short = 'f', long, value_name = "URLS_FILE")]
    urls_file: Option<PathBuf>,

    /// Maximum number of pages to record
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Seconds to wait between pages
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// How the next link is found on each page
    #[arg(long, value_enum)]
    oracle: Option<OracleKind>,

    /// Model used by the llm oracle
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Reasoning effort requested from the model
    #[arg(long, value_enum)]
    reasoning_effort: Option<ReasoningEffort>,

    /// Continue from the last URL in an existing URL list
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start over, overwriting any existing URL list (default)
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Stop after writing the URL list
    #[arg(long, conflicts_with = "convert_only")]
    crawl_only: bool,

    /// Convert the pages of an existing URL list without walking
    #[arg(long, conflicts_with_all = ["crawl_only", "resume", "fresh"])]
    convert_only: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Command-line flags take precedence over the config file
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.markdown_dir = dir.display().to_string();
        }
        if let Some(file) = &self.urls_file {
            config.output.urls_file = file.display().to_string();
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if let Some(delay) = self.delay {
            config.crawler.delay_between_pages = delay;
        }
        if let Some(kind) = self.oracle {
            config.oracle.kind = kind;
        }
        if let Some(model) = &self.model {
            config.oracle.model = model.clone();
        }
        if let Some(effort) = self.reasoning_effort {
            config.oracle.reasoning_effort = effort;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let start_url = cli.start_url.as_deref().map(parse_start_url).transpose()?;
    let config = load_configuration(&cli)?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let urls_path = PathBuf::from(&config.output.urls_file);

    let urls = match start_url {
        Some(start) if !cli.convert_only => {
            handle_walk(&config, &start, &urls_path, cli.resume, cancel.clone()).await?
        }
        _ => read_url_list(&urls_path)
            .with_context(|| format!("Failed to read URL list {}", urls_path.display()))?,
    };

    if cli.crawl_only {
        return Ok(());
    }
    if cancel.is_cancelled() {
        tracing::warn!("Interrupted, skipping conversion");
        return Ok(());
    }

    handle_convert(&config, &urls, cancel).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_walker=info,warn"),
            1 => EnvFilter::new("doc_walker=debug,info"),
            2 => EnvFilter::new("doc_walker=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn parse_start_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid start URL '{}'", raw))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("Start URL must begin with http:// or https://, got '{}'", raw);
    }
    Ok(url)
}

/// Loads the config file (if any), applies CLI overrides and validates
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    Ok(config)
}

/// Cancels the walk on the first Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            cancel.cancel();
        }
    });
}

/// Runs the walk and persists its URL list
async fn handle_walk(
    config: &Config,
    start: &Url,
    urls_path: &Path,
    resume: bool,
    cancel: CancellationToken,
) -> anyhow::Result<Vec<Url>> {
    let previous = if resume {
        previous_urls(urls_path)?
    } else {
        Vec::new()
    };

    let driver = if previous.is_empty() {
        tracing::info!("Starting fresh walk from {}", start);
        build_driver(config, start)?
    } else {
        if previous[0].host_str() != start.host_str() {
            tracing::warn!(
                "{} was started from a different site than {}",
                urls_path.display(),
                start
            );
        }
        build_resumed_driver(config, &previous)?.context("Nothing to resume")?
    };

    let restored = driver.state().ordered_result().to_vec();
    let sink = UrlListWriter::create_with(urls_path, &restored)
        .with_context(|| format!("Failed to open URL list {}", urls_path.display()))?;

    let outcome = driver
        .with_sink(Box::new(sink))
        .with_cancellation(cancel)
        .run()
        .await;

    write_url_list(urls_path, &outcome.urls)
        .with_context(|| format!("Failed to write URL list {}", urls_path.display()))?;

    tracing::info!(
        "Walk finished ({}): {} URLs saved to {}",
        outcome.stop_reason,
        outcome.urls.len(),
        urls_path.display()
    );

    Ok(outcome.urls)
}

/// Reads the list to resume from; a missing file means a fresh start
fn previous_urls(urls_path: &Path) -> anyhow::Result<Vec<Url>> {
    match read_url_list(urls_path) {
        Ok(urls) => {
            if urls.is_empty() {
                tracing::info!("{} is empty, nothing to resume", urls_path.display());
            }
            Ok(urls)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!("No URL list at {}, nothing to resume", urls_path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read URL list {}", urls_path.display())),
    }
}

/// Converts every listed page to Markdown
async fn handle_convert(
    config: &Config,
    urls: &[Url],
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    if urls.is_empty() {
        tracing::warn!("No URLs to convert");
        return Ok(());
    }

    let output_dir = Path::new(&config.output.markdown_dir);
    tracing::info!("Converting {} pages into {}", urls.len(), output_dir.display());

    let converter = HtmlConverter::from_config(&config.user_agent, &config.crawler)
        .context("Failed to build HTTP client")?;
    let report = convert_all_with_cancel(&converter, urls, output_dir, &cancel)
        .await
        .with_context(|| format!("Failed to prepare {}", output_dir.display()))?;

    for (url, error) in report.failures() {
        tracing::warn!("  {}: {}", url, error);
    }
    if report.interrupted {
        tracing::warn!("Conversion interrupted");
    }

    Ok(())
}
