//! doc-fetch main entry point
//!
//! This is the command-line interface for the doc-fetch documentation crawler.

use anyhow::{Context, Result};
use clap::Parser;
use doc_fetch::config::{load_config_with_hash, validate, Config};
use doc_fetch::crawler::crawl_to_file;
use doc_fetch::output::print_statistics;
use doc_fetch::CrawlScope;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exit code for invalid configuration
const EXIT_CONFIG: u8 = 2;

/// Exit code for a crawl that produced no output
const EXIT_CRAWL_FAILED: u8 = 1;

/// doc-fetch: consolidate a documentation site into one markdown file
///
/// doc-fetch crawls a documentation site breadth-first from a root URL,
/// respecting robots.txt and per-host rate limits, extracts the main content
/// of every page and writes it as a single markdown document suitable for
/// LLM consumption.
#[derive(Parser, Debug)]
#[command(name = "doc-fetch")]
#[command(version)]
#[command(about = "Consolidates a documentation site into a single markdown file", long_about = None)]
struct Cli {
    /// Root URL to start crawling from (overrides the config file)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output markdown file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Maximum link depth from the root page
    #[arg(short, long)]
    depth: Option<u32>,

    /// Number of concurrent fetches
    #[arg(short = 'j', long)]
    concurrency: Option<u32>,

    /// Stop after this many pages are included
    #[arg(long)]
    max_pages: Option<usize>,

    /// Requests per second allowed per host
    #[arg(long, value_name = "RATE")]
    rps: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Stop the crawl after this many seconds
    #[arg(long, value_name = "SECS")]
    max_duration: Option<u64>,

    /// Title of the generated document
    #[arg(long)]
    title: Option<String>,

    /// Also write an llm.txt index next to the output
    #[arg(long)]
    llm_txt: bool,

    /// Additional allowed host pattern (exact or *.suffix); repeatable
    #[arg(long = "allow-host", value_name = "PATTERN")]
    allow_hosts: Vec<String>,

    /// Allowed path prefix; repeatable
    #[arg(long = "prefix", value_name = "PATH")]
    prefixes: Vec<String>,

    /// Allow crawling localhost and private network addresses
    #[arg(long)]
    allow_private: bool,

    /// Ignore robots.txt
    #[arg(long)]
    no_robots: bool,

    /// Write nothing if the crawl is interrupted or times out
    #[arg(long)]
    discard_on_abort: bool,

    /// Full User-Agent header to send instead of the generated one
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if cli.dry_run {
        return match handle_dry_run(&config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{:#}", e);
                ExitCode::from(EXIT_CONFIG)
            }
        };
    }

    match handle_crawl(config, cli.quiet).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_CRAWL_FAILED)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is left for the dry-run plan.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_fetch=info,warn"),
            1 => EnvFilter::new("doc_fetch=debug,info"),
            2 => EnvFilter::new("doc_fetch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Layers defaults, the optional config file and command-line flags
fn build_config(cli: &Cli) -> Result<Config> {
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

    if let Some(url) = &cli.url {
        config.scope.root_url = Some(url.clone());
    }
    if let Some(output) = &cli.output {
        config.output.path = output.clone();
    }
    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(rps) = cli.rps {
        config.crawler.requests_per_second = rps;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.request_timeout_secs = timeout;
    }
    if let Some(secs) = cli.max_duration {
        config.crawler.max_duration_secs = Some(secs);
    }
    if let Some(title) = &cli.title {
        config.output.title = Some(title.clone());
    }
    if let Some(user_agent) = &cli.user_agent {
        config.user_agent.override_header = Some(user_agent.clone());
    }
    config.scope.allowed_hosts.extend(cli.allow_hosts.iter().cloned());
    config.scope.path_prefixes.extend(cli.prefixes.iter().cloned());
    config.output.llm_txt |= cli.llm_txt;
    config.output.discard_on_abort |= cli.discard_on_abort;
    config.scope.allow_private_hosts |= cli.allow_private;
    if cli.no_robots {
        config.crawler.respect_robots = false;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<()> {
    let scope = CrawlScope::from_config(config).context("Invalid crawl scope")?;

    println!("=== doc-fetch Dry Run ===\n");

    println!("Scope:");
    println!("  Root URL: {}", scope.root());
    println!("  Allowed hosts: {}", scope.allowed_hosts().join(", "));
    println!("  Path prefixes: {}", scope.path_prefixes().join(", "));
    println!("  Private hosts allowed: {}", config.scope.allow_private_hosts);

    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!(
        "  Rate limit: {} req/s per host (burst {})",
        config.crawler.requests_per_second, config.crawler.burst
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max retries: {}", config.crawler.max_retries);
    match config.crawler.max_duration_secs {
        Some(secs) => println!("  Time limit: {}s", secs),
        None => println!("  Time limit: none"),
    }
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Markdown: {}", config.output.path.display());
    if config.output.llm_txt {
        println!("  llm.txt: {}", config.output.llm_txt_path().display());
    }
    if let Some(title) = &config.output.title {
        println!("  Title: {}", title);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", scope.root());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, quiet: bool) -> Result<()> {
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl-C, stopping crawl");
            interrupt.cancel();
        }
    });

    let report = crawl_to_file(config, cancel).await.context("Crawl failed")?;

    if !quiet {
        print_statistics(&report.stats, report.elapsed);
    }
    if let Some(stop) = report.stop {
        tracing::warn!("Crawl ended early: {}", stop);
    }

    Ok(())
}
