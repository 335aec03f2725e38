//! News-Harvester main entry point
//!
//! This is the command-line interface for the News-Harvester regional news crawler.

use anyhow::Context;
use clap::Parser;
use news_harvester::config::{load_config_with_hash, Config};
use news_harvester::output::{load_statistics, print_health_report, print_statistics};
use news_harvester::sources::SourceRequest;
use news_harvester::storage::{lock, open_storage, shared};
use news_harvester::CrawlOrchestrator;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// News-Harvester: an autonomous regional news crawler
///
/// News-Harvester discovers articles on the configured news sources through
/// RSS feeds, sitemaps or index pages, stores their text, and keeps track of
/// which sources and links are still alive.
#[derive(Parser, Debug)]
#[command(name = "news-harvester")]
#[command(version = "1.0.0")]
#[command(about = "An autonomous regional news crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single crawl cycle and exit
    #[arg(long, group = "mode")]
    once: bool,

    /// Show the health of every source and exit
    #[arg(long, group = "mode")]
    health: bool,

    /// Show statistics from the database and exit
    #[arg(long, group = "mode")]
    stats: bool,

    /// Reactivate a deactivated source and exit
    #[arg(long, value_name = "SOURCE_ID", group = "mode")]
    reactivate: Option<i64>,

    /// Clear the link status of one URL, or of every URL when none is given
    #[arg(long, value_name = "URL", num_args = 0..=1, default_missing_value = "", group = "mode")]
    reset_links: Option<String>,

    /// Add a source, detecting how to crawl it
    #[arg(long, num_args = 2, value_names = ["NAME", "URL"], group = "mode")]
    add_source: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let storage = shared(
        open_storage(Path::new(&config.output.database_path))
            .with_context(|| format!("failed to open {}", config.output.database_path))?,
    );
    let orchestrator = CrawlOrchestrator::new(&config, storage)?;

    let seeded = orchestrator.sources().seed(&config.source)?;
    if seeded > 0 {
        tracing::info!("Seeded {} sources from configuration", seeded);
    }

    if cli.once {
        handle_once(&orchestrator).await
    } else if cli.health {
        print_health_report(&orchestrator.health().report()?);
        Ok(())
    } else if cli.stats {
        handle_stats(&orchestrator, &config)
    } else if let Some(id) = cli.reactivate {
        orchestrator.health().reactivate(id)?;
        println!("Source {} reactivated", id);
        Ok(())
    } else if let Some(url) = cli.reset_links {
        let url = Some(url.as_str()).filter(|u| !u.is_empty());
        let cleared = orchestrator.links().reset(url)?;
        println!("Cleared {} link status records", cleared);
        Ok(())
    } else if let Some(args) = cli.add_source {
        handle_add_source(&orchestrator, &args).await
    } else {
        run_daemon(&orchestrator, &config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("news_harvester=info,warn"),
            1 => EnvFilter::new("news_harvester=debug,info"),
            2 => EnvFilter::new("news_harvester=trace,debug"),
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

async fn handle_once(orchestrator: &CrawlOrchestrator) -> anyhow::Result<()> {
    let report = orchestrator.manual_crawl().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.is_success() {
        Ok(())
    } else {
        anyhow::bail!("{}", report.message)
    }
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(orchestrator: &CrawlOrchestrator, config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let stats = {
        let storage = lock(orchestrator.storage())?;
        load_statistics(&*storage)?
    };
    print_statistics(&stats);

    let status = orchestrator.status();
    println!("\nConfigured interval: {}s", status.interval_seconds);
    Ok(())
}

async fn handle_add_source(orchestrator: &CrawlOrchestrator, args: &[String]) -> anyhow::Result<()> {
    let [name, url] = args else {
        anyhow::bail!("--add-source takes a name and a URL");
    };

    let source = orchestrator
        .sources()
        .add_source(SourceRequest::auto(name.as_str(), url.as_str()))
        .await?;
    println!(
        "Added source {} '{}' ({}) at {}",
        source.id, source.name, source.crawl_type, source.base_url
    );
    Ok(())
}

/// Runs the interval scheduler until Ctrl-C, then drains
async fn run_daemon(orchestrator: &CrawlOrchestrator, config: &Config) -> anyhow::Result<()> {
    let sources = orchestrator.sources().summary()?;
    tracing::info!(
        "Sources: {} total, {} active, {} inactive",
        sources.total,
        sources.active,
        sources.inactive
    );

    if config.crawler.auto_start {
        tracing::info!("Running an initial crawl before scheduling");
        orchestrator.manual_crawl().await;
    }

    let transition = orchestrator.start_auto(config.crawler.interval_seconds)?;
    tracing::info!("{}", transition.message());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("Shutdown requested, waiting for the current cycle to finish");

    orchestrator.shutdown().await;
    Ok(())
}
