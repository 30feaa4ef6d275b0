//! board-watcher CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use board_watcher::{
    error::{AppError, Result},
    models::{Config, Watermark},
    pipeline::{RetryOutcome, RetryPolicy, Scheduler, WatchRules, Watcher, run_with_retry},
    services::{BoardFetcher, DryRunNotifier, HtmlBoardFetcher, Notifier, TelegramNotifier},
    utils::http,
};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

/// board-watcher - Forum Board Keyword Notifier
#[derive(Parser, Debug)]
#[command(
    name = "board-watcher",
    version,
    about = "Watches a forum board and sends Telegram alerts for keyword matches"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the board on the configured interval until interrupted
    Run {
        /// Log messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a single check (with retries) and exit
    Once {
        /// Log messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch the board once and print the parsed posts
    Fetch,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_watcher(config: &Config, client: reqwest::Client, dry_run: bool) -> Result<Watcher> {
    let fetcher: Arc<dyn BoardFetcher> =
        Arc::new(HtmlBoardFetcher::new(client.clone(), config.board.clone())?);

    let notifier: Arc<dyn Notifier> = if dry_run {
        Arc::new(DryRunNotifier)
    } else {
        config.require_credentials()?;
        Arc::new(TelegramNotifier::new(client, config.telegram.clone()))
    };

    Ok(Watcher::new(fetcher, notifier, WatchRules::from_config(config)))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("board-watcher starting...");

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();

    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run { dry_run } => {
            config.validate()?;
            let client = http::create_client(&config.crawler)?;
            let watcher = build_watcher(&config, client, dry_run)?;

            log::info!(
                "Watching {} for {:?}",
                config.board.url,
                watcher.rules().keywords
            );

            let cancel = CancellationToken::new();
            let shutdown = cancel.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => log::info!("Interrupt received, shutting down..."),
                    Err(e) => log::error!("Failed to listen for interrupt: {}", e),
                }
                shutdown.cancel();
            });

            let scheduler = Scheduler::new(
                watcher,
                RetryPolicy::from_config(&config.schedule),
                config.schedule.poll_interval(),
                cancel,
            )?;
            let watermark = scheduler.run().await;

            if let Some(updated) = watermark.updated_at() {
                log::info!("Last seen post: {} (at {})", watermark.key(), updated);
            }
        }

        Command::Once { dry_run } => {
            config.validate()?;
            let client = http::create_client(&config.crawler)?;
            let watcher = build_watcher(&config, client, dry_run)?;

            let mut watermark = Watermark::new();
            let outcome = run_with_retry(
                &watcher,
                &mut watermark,
                &RetryPolicy::from_config(&config.schedule),
                &CancellationToken::new(),
            )
            .await;

            match outcome {
                RetryOutcome::Succeeded { report, .. } => {
                    log::info!(
                        "Checked {} posts, {} notified, {} delivery failure(s)",
                        report.fetched,
                        report.notified.len(),
                        report.failed_deliveries
                    );
                }
                RetryOutcome::Exhausted { last_error, .. } => return Err(last_error),
                RetryOutcome::Cancelled { .. } => {}
            }
        }

        Command::Fetch => {
            let client = http::create_client(&config.crawler)?;
            let fetcher = HtmlBoardFetcher::new(client, config.board.clone())?;
            let posts = fetcher.fetch().await;

            if posts.is_empty() {
                return Err(AppError::EmptyFetch);
            }

            log::info!("Fetched {} posts from {}", posts.len(), fetcher.source());
            for post in &posts {
                println!("{}\t{}", post.display_title(), post.link);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            HtmlBoardFetcher::new(reqwest::Client::new(), config.board.clone())?;
            log::info!("✓ Config OK (board, selectors, keywords, schedule)");

            match config.require_credentials() {
                Ok(()) => log::info!("✓ Telegram credentials present"),
                Err(e) => log::warn!("{}", e),
            }

            log::info!("All validations passed!");
        }
    }

    log::info!("Done!");

    Ok(())
}
