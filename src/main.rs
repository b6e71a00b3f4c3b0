//! Job-Crawler main entry point
//!
//! This is the command-line interface for crawling job boards into a local
//! posting store and reporting trends over it.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use job_crawler::config::{load_config_with_hash, Config};
use job_crawler::crawler::{CrawlTrigger, Dispatcher};
use job_crawler::report::{load_trend_report, print_trend_report, DEFAULT_TOP_N};
use job_crawler::storage::{shared, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Job-Crawler: collect remote job postings and spot trends
///
/// Crawls the configured job boards for the requested roles, stores each
/// posting once (keyed by a content hash), and reports the most requested
/// skills, locations, companies and experience levels.
#[derive(Parser, Debug)]
#[command(name = "job-crawler")]
#[command(version)]
#[command(about = "Crawl job boards into a deduplicated posting store", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Role to crawl for; repeat for several roles
    #[arg(short, long = "role", value_name = "ROLE")]
    roles: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the seed URLs without crawling
    #[arg(long, conflicts_with_all = ["trends", "purge_expired"])]
    dry_run: bool,

    /// Print top-N trends from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "purge_expired"])]
    trends: bool,

    /// Only count postings whose title contains this text (with --trends)
    #[arg(long, requires = "trends")]
    title: Option<String>,

    /// Entries per trend group (with --trends)
    #[arg(long, default_value_t = DEFAULT_TOP_N, requires = "trends")]
    top: usize,

    /// Delete postings past their retention date and exit
    #[arg(long, conflicts_with_all = ["dry_run", "trends"])]
    purge_expired: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &config_hash, &cli.roles)
    } else if cli.trends {
        handle_trends(&config, cli.title.as_deref(), cli.top)
    } else if cli.purge_expired {
        handle_purge(&config)
    } else {
        handle_crawl(&config, config_hash, &cli.roles).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_crawler=info,warn"),
            1 => EnvFilter::new("job_crawler=debug,info"),
            2 => EnvFilter::new("job_crawler=trace,debug"),
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

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))
}

/// Handles the --dry-run mode: validates config and shows the seed URLs
fn handle_dry_run(config: &Config, config_hash: &str, roles: &[String]) -> anyhow::Result<()> {
    println!("=== Job-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max jobs: {}", config.crawler.max_jobs);
    println!("  Crawl budget: {}s", config.crawler.crawl_timeout_secs);
    println!("  Task timeout: {}s", config.crawler.task_timeout_secs);
    println!("  Frontier capacity: {}", config.crawler.frontier_capacity);

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Database: {}", config.output.database_path);
    println!("Allowed roles: {}", config.roles.allowed.join(", "));

    // The store is never opened in dry-run mode
    let dispatcher = Dispatcher::from_config(
        config,
        config_hash,
        shared(SqliteStorage::open_in_memory()?),
    )?;

    println!("\nSite parsers ({}):", dispatcher.registry().len());
    for parser in dispatcher.registry().iter() {
        println!("  - {}", parser.name());
    }

    let (accepted, rejected) = config.roles.partition(roles);
    for role in &rejected {
        println!("\n✗ Role not allowed: {}", role);
    }

    let seeds = dispatcher.seed_tasks(&accepted);
    println!("\nSeed URLs ({}):", seeds.len());
    for seed in &seeds {
        println!("  * {}", seed.url());
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --trends mode: prints top-N counts from the database
fn handle_trends(config: &Config, title: Option<&str>, top: usize) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(config)?;
    let report = load_trend_report(&storage, title, top)?;
    print_trend_report(&report);

    Ok(())
}

/// Handles the --purge-expired mode
fn handle_purge(config: &Config) -> anyhow::Result<()> {
    let mut storage = open_storage(config)?;
    let removed = storage.purge_expired(Utc::now())?;
    println!("✓ Removed {} expired postings", removed);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: String, roles: &[String]) -> anyhow::Result<()> {
    if roles.is_empty() {
        anyhow::bail!("No roles given; pass at least one --role");
    }

    let storage = shared(open_storage(config)?);
    let dispatcher = Dispatcher::from_config(config, config_hash, storage)?;
    let handle = CrawlTrigger::new(dispatcher).submit(roles)?;

    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current task");
            cancel.cancel();
        }
    });

    let summary = handle.wait().await?;

    println!("\n=== Crawl Summary ===");
    println!("  Stopped: {}", summary.stop_reason);
    println!("  Jobs stored: {}", summary.stored);
    println!("  Tasks processed: {}", summary.processed);
    println!("  Tasks skipped: {}", summary.skipped);
    println!("  Tasks failed: {}", summary.failed);
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(())
}
