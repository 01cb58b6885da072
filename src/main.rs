//! publish-pilot - restore and publish cycles against the admin console
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use publish_pilot::browser::{TokioClock, WebDriverFactory};
use publish_pilot::core::config::BrowserKind;
use publish_pilot::{Config, Driver};

/// publish-pilot - restore backups and publish through the admin console
#[derive(Parser, Debug)]
#[command(name = "publish-pilot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: ~/.config/publish-pilot/config.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Browser backend (chrome or firefox)
    #[arg(long, short = 'b')]
    browser: Option<BrowserKind>,

    /// Run with a visible browser window
    #[arg(long)]
    headed: bool,

    /// Log filter when RUST_LOG is not set (e.g. info, debug)
    #[arg(long, short = 'l')]
    log_level: Option<String>,

    /// Publication timeout in minutes
    #[arg(long)]
    publish_timeout: Option<u64>,

    /// Restore timeout in minutes
    #[arg(long)]
    restore_timeout: Option<u64>,

    /// First design backup index to process
    #[arg(long, default_value_t = 0)]
    start_index: usize,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("{}", Config::default_config_toml());
        return Ok(());
    }

    // Build configuration
    let mut config = match args.config {
        Some(ref path) => {
            let _ = dotenvy::dotenv();
            Config::load_from(path)?
        }
        None => Config::load(),
    };

    // Apply CLI overrides
    if let Some(browser) = args.browser {
        config.browser.kind = browser;
    }

    if args.headed {
        config.browser.headless = false;
    }

    if let Some(level) = args.log_level {
        config.log.level = level;
    }

    if let Some(minutes) = args.publish_timeout {
        config.timing.publish_timeout_minutes = minutes;
    }

    if let Some(minutes) = args.restore_timeout {
        config.timing.restore_timeout_minutes = minutes;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate()?;

    let factory = WebDriverFactory::new(config.browser.clone());
    let driver = Driver::new(factory, Arc::new(config), Arc::new(TokioClock))
        .with_start_index(args.start_index);

    let summary = driver.run().await?;
    info!(
        cycles = summary.cycles,
        publications = summary.publications.len(),
        failures = summary.failures.len(),
        "Run finished"
    );

    Ok(())
}
