//! Pairwatch - New-Pair Watcher and Price Collector
//!
//! Watches a BSC DEX factory for new pairs against a reference token and
//! prints both legs' prices once Birdeye can quote them.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

use pairwatch::adapters::cli::{CliApp, Command, PriceCmd, RunCmd};
use pairwatch::adapters::{BirdeyeClient, BirdeyeConfig, ConsolePrinter, EvmChainClient};
use pairwatch::application::{CollectorConfig, FetcherConfig, PairWatcher, PriceCollector, PriceFetcher};
use pairwatch::config::{load_config, validate_address, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in the TOML config)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config_path = match &app.command {
        Command::Run(cmd) => &cmd.config,
        Command::Price(cmd) => &cmd.config,
    };
    let config = load_config_file(config_path)?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Price(cmd) => price_command(cmd, config).await,
    }
}

fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    };
    let filter = EnvFilter::new(level);

    fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}

/// Expand `~` and load the TOML config
fn load_config_file(path: &Path) -> Result<Config> {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string());
    load_config(&expanded)
        .with_context(|| format!("Failed to load configuration from {}", expanded.display()))
}

fn build_fetcher(config: &Config) -> Result<PriceFetcher<BirdeyeClient>> {
    let api_key = match config.pricing.get_api_key() {
        Some(key) => key,
        None => {
            tracing::warn!("No Birdeye API key configured (set pricing.api_key or BIRDEYE_API_KEY)");
            String::new()
        }
    };

    let client = BirdeyeClient::new(BirdeyeConfig {
        api_base_url: config.pricing.api_url.clone(),
        api_key,
        chain: config.pricing.chain.clone(),
        timeout: std::time::Duration::from_secs(config.pricing.request_timeout_secs),
    })
    .context("Failed to create Birdeye client")?;

    Ok(PriceFetcher::new(client, FetcherConfig::from(config)))
}

async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    tracing::info!("Starting pairwatch...");

    let reference = cmd
        .reference
        .unwrap_or_else(|| config.chain.reference_token.clone());
    validate_address("--reference", &reference)?;

    let fetcher = build_fetcher(&config)?;
    tracing::info!(
        "Price gate: {} concurrent lookups ({} requests/min)",
        fetcher.config().gate_width(),
        fetcher.config().max_requests_per_minute
    );

    let printer = ConsolePrinter::new(config.chain.explorer_tx_url.clone());
    let collector = PriceCollector::new(fetcher, printer, CollectorConfig::from(&config));

    let chain = EvmChainClient::connect_http(&config.chain.get_rpc_url(), &config.chain.factory_address)
        .context("Failed to create chain client")?;
    let watcher = PairWatcher::new(chain.clone(), chain, collector.handle(), reference)
        .with_poll_interval(config.chain.poll_interval());

    tokio::select! {
        _ = collector.run() => {
            tracing::warn!("Price collector stopped");
        }
        result = watcher.run() => {
            result.context("Pair watcher stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Pairwatch stopped");
    Ok(())
}

async fn price_command(cmd: PriceCmd, config: Config) -> Result<()> {
    let fetcher = build_fetcher(&config)?;

    match fetcher.get_token_price(&cmd.address).await {
        Some(price) => println!("{}: {}", cmd.address, price),
        None => println!("{}: unavailable", cmd.address),
    }
    Ok(())
}
