//! Sumi-Scrape main entry point
//!
//! Runs the MCP tool server over stdio, or a single scrape or crawl from the
//! command line. Logs go to stderr; stdout carries protocol messages and results.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use sumi_scrape::config::{load_config_with_hash, Config};
use sumi_scrape::extract::ExtractionMode;
use sumi_scrape::fetcher::Identity;
use sumi_scrape::tool::{run_stdio, CrawlArgs, ScrapeArgs, ToolDispatcher};
use tracing_subscriber::EnvFilter;

/// Sumi-Scrape: web scraping tools for AI assistants
///
/// Fetches pages through a headless browser, stealth HTTP and raw HTTP in
/// turn, extracts text, links, images, metadata, tables and articles, and
/// crawls sites breadth-first.
#[derive(Parser, Debug)]
#[command(name = "sumi-scrape")]
#[command(version)]
#[command(about = "Web scraping tools for AI assistants", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the scraping tools over MCP on stdin/stdout
    Serve,

    /// Scrape one page and print the result as JSON
    Scrape {
        url: String,

        /// text, links, images, metadata, table, article or all
        #[arg(short = 't', long, default_value = "text")]
        extract_type: String,

        /// CSS selector narrowing the extraction
        #[arg(short, long)]
        selector: Option<String>,

        /// Maximum items to return
        #[arg(short = 'n', long)]
        max_results: Option<i64>,

        /// Render with the headless browser first
        #[arg(long)]
        javascript: bool,

        /// Send the declared crawler identity instead of rotating
        #[arg(long)]
        no_stealth: bool,
    },

    /// Crawl a site breadth-first and print the report as JSON
    Crawl {
        url: String,

        #[arg(long)]
        max_pages: Option<i64>,

        #[arg(long)]
        max_depth: Option<i64>,

        /// Follow links to other sites too
        #[arg(long)]
        any_domain: bool,
    },

    /// Validate the configuration and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;
    let dispatcher = ToolDispatcher::new(config);

    match cli.command {
        Command::Serve => {
            tracing::info!("Serving MCP tools on stdio");
            run_stdio(dispatcher).await.context("MCP server I/O failed")?;
        }
        Command::Scrape {
            url,
            extract_type,
            selector,
            max_results,
            javascript,
            no_stealth,
        } => {
            let mode: ExtractionMode = serde_json::from_value(json!(extract_type))
                .with_context(|| format!("Unknown extract type: {}", extract_type))?;
            let args = ScrapeArgs {
                url,
                extract_type: Some(mode),
                selector,
                max_results,
                use_javascript: Some(javascript),
                stealth_mode: Some(!no_stealth),
                ..Default::default()
            };
            let result = dispatcher.scrape(args).await?;
            print_json(&result)?;
        }
        Command::Crawl {
            url,
            max_pages,
            max_depth,
            any_domain,
        } => {
            let args = CrawlArgs {
                url,
                max_pages,
                max_depth,
                content_focus: None,
                same_domain_only: Some(!any_domain),
            };
            let report = dispatcher.crawl(args).await?;
            print_json(&serde_json::to_value(&report)?)?;
        }
        Command::CheckConfig => handle_check_config(dispatcher.config()),
    }

    Ok(())
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Output goes to stderr so it never interleaves with MCP messages.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scrape=info,warn"),
            1 => EnvFilter::new("sumi_scrape=debug,info"),
            2 => EnvFilter::new("sumi_scrape=trace,debug"),
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

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_check_config(config: &Config) {
    println!("=== Sumi-Scrape Configuration ===\n");

    println!("Fetcher:");
    println!("  Timeout: {}ms", config.fetcher.timeout_ms);
    println!("  Raw HTTP timeout: {}ms", config.fetcher.raw_timeout_ms);
    println!("  Max body: {} bytes", config.fetcher.max_body_bytes);
    println!("  Max redirects: {}", config.fetcher.max_redirects);

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff: {}ms base, {}ms cap",
        config.retry.base_delay_ms, config.retry.max_delay_ms
    );

    println!("\nIdentity:");
    let identity = Identity::from_config(&config.identity);
    println!("  Declared: {}", identity.declared_agent());
    println!("  Rotation pool: {} user agents", config.identity.user_agents.len());

    println!("\nBrowser:");
    println!("  Enabled: {}", config.browser.enabled);
    if let Some(path) = &config.browser.chrome_path {
        println!("  Chrome: {}", path);
    }

    println!("\nCrawler:");
    println!(
        "  Delay: {}-{}ms",
        config.crawler.delay_min_ms, config.crawler.delay_max_ms
    );
    println!("  Links per page: {}", config.crawler.links_per_page);
    println!("  Robots policy: {}", config.crawler.robots_policy);

    println!("\nBlocked domains ({}):", config.blocked_domains.len());
    for pattern in &config.blocked_domains {
        println!("  - {}", pattern);
    }

    println!("\n✓ Configuration is valid");
}
