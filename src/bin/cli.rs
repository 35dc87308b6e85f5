//! Exposure watcher CLI
//!
//! Long-running entry point: polls the exposure page and serves bot commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use exposure_watch::{
    bot::{TelegramBot, run_command_listener},
    context::AppContext,
    error::Result,
    models::{Config, ExposureCategory},
    pipeline,
    services::{FilePageSource, HttpPageSource, PageSource, TableExtractor, fingerprint},
    storage::{KeyValueStore, MemoryStore, RedisStore},
};
use tokio::sync::watch;

/// exposure-watch - COVID-19 exposure site notifier
#[derive(Parser, Debug)]
#[command(
    name = "exposure-watch",
    version,
    about = "Notifies subscribers of new COVID-19 exposure sites"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Keep state in memory instead of the configured store
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the page and answer bot commands until interrupted
    Run,

    /// Run a single update cycle and exit
    Once,

    /// Parse the page and print what was found, without touching the store
    Inspect {
        /// Read a saved copy of the page instead of fetching it
        #[arg(long)]
        file: Option<PathBuf>,
    },

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

async fn open_store(config: &Config, memory: bool) -> Result<Arc<dyn KeyValueStore>> {
    if memory {
        log::warn!("Using in-memory store; state is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }
    Ok(Arc::new(RedisStore::connect(&config.store).await?))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config)?;
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Validate => {
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if config.bot.token.trim().is_empty() {
                log::warn!("bot.token is empty; `run` and `once` will refuse to start");
            }
            log::info!("✓ Config OK");
        }

        Command::Inspect { file } => {
            config.validate()?;
            let source: Box<dyn PageSource> = match file {
                Some(path) => Box::new(FilePageSource::new(path)),
                None => Box::new(HttpPageSource::new(&config.source)?),
            };
            log::info!("Reading {}", source.describe());

            let html = source.fetch().await?;
            let page = TableExtractor::from_config(&config)?.extract(&html)?;
            log::info!("Page last updated: {}", page.marker);

            for category in ExposureCategory::ALL {
                let records = page.records(category);
                log::info!("{} ({} rows)", category.header(), records.len());
                for record in records {
                    match fingerprint(record) {
                        Ok(fp) => log::info!("    {} {:?}", &fp.as_str()[..12], record),
                        Err(e) => log::warn!("    unusable row {:?}: {}", record, e),
                    }
                }
            }
        }

        Command::Once => {
            config.validate()?;
            let store = open_store(&config, cli.memory).await?;
            let bot = Arc::new(TelegramBot::new(&config.bot)?);
            let source = Arc::new(HttpPageSource::new(&config.source)?);
            let ctx = AppContext::new(config, store, source, bot)?;

            let result = pipeline::run_cycle(&ctx).await;
            pipeline::log_outcome(&result);
            result?;
        }

        Command::Run => {
            config.validate()?;
            let store = open_store(&config, cli.memory).await?;
            let bot = Arc::new(TelegramBot::new(&config.bot)?);
            let source = Arc::new(HttpPageSource::new(&config.source)?);
            let ctx = Arc::new(AppContext::new(config, store, source, bot.clone())?);

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::info!("Shutdown requested");
                    let _ = shutdown_tx.send(true);
                }
            });

            tokio::join!(
                pipeline::run_poll_loop(Arc::clone(&ctx), shutdown_rx.clone()),
                run_command_listener(bot, ctx, shutdown_rx),
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
