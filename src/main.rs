//! Forum-Sift main entry point
//!
//! This is the command-line interface for the Forum-Sift board digest.

use anyhow::Context;
use clap::{Parser, Subcommand};
use forum_sift::api::{self, ApiReply, MarkRequest};
use forum_sift::browser::ChromeLauncher;
use forum_sift::config::{load_config_with_hash, Config};
use forum_sift::crawler::Coordinator;
use forum_sift::output::{print_statistics, summarize, write_snapshot};
use forum_sift::storage::open_store;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Forum-Sift: a watched-board forum digest
///
/// Forum-Sift drives a headless browser through a forum's headline page and
/// watched boards, keeps only fresh posts, and hides what you already read
/// or dismissed.
#[derive(Parser, Debug)]
#[command(name = "forum-sift")]
#[command(version)]
#[command(about = "A watched-board forum digest", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

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
    /// Crawl the headline page and every watched board
    Crawl,

    /// Mark a post URL as read or deleted
    Mark {
        #[arg(long)]
        url: Option<String>,

        /// "read" (default) or "delete"
        #[arg(long)]
        action: Option<String>,
    },

    /// Run the batch job and write the offline snapshot file
    Snapshot {
        /// Overrides [snapshot].output-path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Load an offline snapshot (path or http(s) URL) and reconcile it
    Offline {
        /// Defaults to [snapshot].output-path
        #[arg(long)]
        source: Option<String>,
    },

    /// Validate config and show what would be crawled
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected command; `Ok(false)` means a failure envelope was printed
async fn run(cli: Cli) -> anyhow::Result<bool> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    let config = Arc::new(config);

    match cli.command {
        Command::Crawl => handle_crawl(config).await,
        Command::Mark { url, action } => handle_mark(&config, MarkRequest { url, action }),
        Command::Snapshot { output } => handle_snapshot(config, output).await,
        Command::Offline { source } => handle_offline(&config, source).await,
        Command::Check => {
            handle_check(&config);
            Ok(true)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is reserved for JSON envelopes.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forum_sift=info,warn"),
            1 => EnvFilter::new("forum_sift=debug,info"),
            2 => EnvFilter::new("forum_sift=trace,debug"),
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

fn emit<T: Serialize>(reply: &ApiReply<T>) -> bool {
    println!("{}", reply.to_json());
    if !reply.is_success() {
        tracing::debug!("Request finished with status {}", reply.status);
    }
    reply.is_success()
}

async fn handle_crawl(config: Arc<Config>) -> anyhow::Result<bool> {
    let store = open_store(&config.state).context("Failed to open state store")?;
    let launcher = ChromeLauncher::new(config.browser.clone());

    tracing::info!("Watching {} boards", config.watch.boards.len());
    let coordinator = Coordinator::new(config, Box::new(launcher), store);

    Ok(emit(&api::trigger_crawl(&coordinator).await))
}

fn handle_mark(config: &Config, request: MarkRequest) -> anyhow::Result<bool> {
    let store = open_store(&config.state).context("Failed to open state store")?;
    Ok(emit(&api::mark_state(&store, &request)))
}

async fn handle_snapshot(config: Arc<Config>, output: Option<PathBuf>) -> anyhow::Result<bool> {
    let path = output.unwrap_or_else(|| config.snapshot.output_path.clone());
    let launcher = ChromeLauncher::new(config.browser.clone());
    let coordinator = Coordinator::for_snapshot(config, Box::new(launcher));

    let result = coordinator.run().await.context("Snapshot crawl failed")?;
    write_snapshot(&result, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    print_statistics(&summarize(&result));
    println!("✓ Snapshot written to: {}", path.display());
    Ok(true)
}

async fn handle_offline(config: &Config, source: Option<String>) -> anyhow::Result<bool> {
    let source =
        source.unwrap_or_else(|| config.snapshot.output_path.display().to_string());
    let store = open_store(&config.state).context("Failed to open state store")?;

    Ok(emit(&api::load_offline(&store, &source).await))
}

/// Validates config and shows what would be crawled without launching a browser
fn handle_check(config: &Config) {
    println!("=== Forum-Sift Check ===\n");

    println!("Site:");
    println!("  Headlines: {}", config.site.base_url);
    println!("  Board template: {}", config.site.board_url_template);
    println!("  Timezone: {}", config.site.timezone);

    println!("\nWatched Boards ({}):", config.watch.boards.len());
    for board in &config.watch.boards {
        println!("  - {} -> {}", board, config.site.board_url(board));
    }

    println!("\nFilters:");
    println!("  Fetch limit: {}", config.watch.fetch_limit);
    println!("  Exclude: {}", config.watch.exclude_keywords.join(", "));
    println!("  Fresh if time contains: {}", config.watch.freshness_keywords.join(", "));
    println!(
        "  Delay between boards: {}-{}ms",
        config.rate_limit.min_delay_ms, config.rate_limit.max_delay_ms
    );

    println!("\nBrowser:");
    println!("  Mode: {:?}", config.browser.mode);
    println!("  Block resources: {}", config.browser.block_resources);

    println!("\nState:");
    println!("  Backend: {:?}", config.state.backend);
    println!(
        "  TTL: read {} days, deleted {} days",
        config.state.read_ttl_days, config.state.delete_ttl_days
    );

    println!("\nSnapshot:");
    println!("  Output: {}", config.snapshot.output_path.display());
    println!("  Fetch limit: {}", config.snapshot.fetch_limit);

    println!("\n✓ Configuration is valid");
}
